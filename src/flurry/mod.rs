//! Flurry: a compact, self-describing tagged binary format.
//!
//! Every value starts with one tag byte that announces its type and, for
//! short values, carries the value itself. The tag space is laid out in
//! [`tags`]. The encoder always picks the shortest tag that holds a value
//! exactly; the decoder accepts any tag of the right family whose value fits
//! the destination.
//!
//! # Example
//!
//! ```rust
//! use arsenal::flurry::{Reader, Writer};
//! use arsenal::Result;
//!
//! fn main() -> Result<()> {
//!     let mut writer = Writer::new();
//!     writer.pack_bool(true)?;
//!     writer.pack_i32(42)?;
//!     writer.pack_str("hello")?;
//!     let data = writer.into_bytes();
//!     assert_eq!(&data[..2], &[0xc3, 0x2a]);
//!
//!     let mut reader = Reader::new(&data);
//!     assert!(reader.unpack_bool()?);
//!     assert_eq!(reader.unpack_u8()?, 42);
//!     assert_eq!(reader.unpack_str()?, "hello");
//!     Ok(())
//! }
//! ```

mod pack;
mod reader;
pub mod tags;
mod value;
mod writer;

pub use pack::{Pack, Unpack};
pub use reader::{Integer, Limits, Reader, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH};
pub use tags::{Family, Tag, Width};
pub use value::Value;
pub use writer::Writer;

use crate::error::Result;

/// Encodes a value into a new buffer.
pub fn to_vec<T: Pack + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    value.pack(&mut writer)?;
    Ok(writer.into_bytes())
}

/// Decodes one value from the front of `data` with default limits.
///
/// Bytes after the value are ignored; use a [`Reader`] to decode a sequence.
pub fn from_slice<T: Unpack>(data: &[u8]) -> Result<T> {
    Reader::new(data).unpack()
}
