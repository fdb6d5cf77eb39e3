//! Arsenal - binary serialization toolkit and support utilities
//!
//! Two codecs sit at the core:
//!
//! - [`flurry`]: a self-describing tagged format, byte-compatible with
//!   MessagePack, with a minimal-width encoder and a width-tolerant decoder.
//! - [`fusionary`]: declarative records mapped field by field onto fixed
//!   binary layouts, with flag-controlled optional and variant fields.
//!
//! Around them: [`endian`] scalars, [`stream`] framing of flurry blobs,
//! [`settings`] storage, [`dump`] files and [`hexdump`] formatting.
//!
//! # Example
//!
//! ```rust
//! use arsenal::endian::BigU16;
//! use arsenal::flurry::{self, Value};
//! use arsenal::fusionary::{self, FieldFlag, OptionalField};
//! use arsenal::Result;
//!
//! arsenal::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     struct Header {
//!         flags: FieldFlag<u8>,
//!         port: OptionalField<BigU16, 0, 0>,
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let data = flurry::to_vec(&vec![Value::Bool(true), Value::I32(42)])?;
//!     assert_eq!(data, [0x92, 0xc3, 0x2a]);
//!     assert_eq!(flurry::from_slice::<Value>(&[0x2a])?, Value::U64(42));
//!
//!     let (header, rest) = fusionary::read::<Header>(&[1, 0x1f, 0x90, 0xff])?;
//!     assert_eq!(header.port.as_ref().map(|p| p.get()), Some(8080));
//!     assert_eq!(rest, [0xff]);
//!     Ok(())
//! }
//! ```

pub mod dump;
pub mod endian;
mod error;
pub mod flurry;
pub mod fusionary;
pub mod hexdump;
pub mod settings;
pub mod stream;

pub use error::{Error, ErrorKind, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
