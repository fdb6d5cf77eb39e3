//! Fixed-width integers with a declared byte order.
//!
//! An [`Endian`] stores its value in memory already arranged in the byte order
//! `O`, and converts on every read or store. Code always sees host-native
//! values while the in-struct layout stays deterministic, which is what the
//! fusionary engine copies to and from the wire.
//!
//! ```rust
//! use arsenal::endian::{BigU32, LittleU32};
//!
//! let big = BigU32::new(0xdeadbeef);
//! let little = LittleU32::new(0xdeadbeef);
//! assert_eq!(big, little);
//! assert_eq!(big.to_bytes(), [0xde, 0xad, 0xbe, 0xef]);
//! assert_eq!(little.to_bytes(), [0xef, 0xbe, 0xad, 0xde]);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Integer types that can be stored with an explicit byte order.
pub trait Scalar: Copy + Default + PartialEq + PartialOrd + fmt::Debug + fmt::Display {
    /// Byte array holding one value.
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Encoded width in bytes.
    const SIZE: usize;

    /// Type name used in error messages.
    const NAME: &'static str;

    /// Reads a value stored in order `O` from the front of `buf`.
    fn read_ordered<O: ByteOrder>(buf: &[u8]) -> Self;

    /// Writes the value in order `O` to the front of `buf`.
    fn write_ordered<O: ByteOrder>(self, buf: &mut [u8]);

    /// Native-order bytes of the value.
    fn to_ne_bytes(self) -> Self::Bytes;

    /// Value from native-order bytes.
    fn from_ne_bytes(bytes: Self::Bytes) -> Self;

    /// Raw bits zero-extended to 64 bits.
    fn to_bits(self) -> u64;

    /// Converts between host order and order `O`. Applying it twice is the identity.
    #[inline]
    fn reorder<O: ByteOrder>(self) -> Self {
        let mut bytes = Self::Bytes::default();
        self.write_ordered::<O>(bytes.as_mut());
        Self::from_ne_bytes(bytes)
    }
}

macro_rules! impl_scalar {
    ($type:ty, $unsigned:ty, $size:expr, $read:ident, $write:ident) => {
        impl Scalar for $type {
            type Bytes = [u8; $size];
            const SIZE: usize = $size;
            const NAME: &'static str = stringify!($type);

            #[inline]
            fn read_ordered<O: ByteOrder>(buf: &[u8]) -> Self {
                O::$read(buf)
            }

            #[inline]
            fn write_ordered<O: ByteOrder>(self, buf: &mut [u8]) {
                O::$write(buf, self)
            }

            #[inline]
            fn to_ne_bytes(self) -> Self::Bytes {
                <$type>::to_ne_bytes(self)
            }

            #[inline]
            fn from_ne_bytes(bytes: Self::Bytes) -> Self {
                <$type>::from_ne_bytes(bytes)
            }

            #[inline]
            fn to_bits(self) -> u64 {
                self as $unsigned as u64
            }
        }
    };
}

impl_scalar!(u16, u16, 2, read_u16, write_u16);
impl_scalar!(u32, u32, 4, read_u32, write_u32);
impl_scalar!(u64, u64, 8, read_u64, write_u64);
impl_scalar!(i16, u16, 2, read_i16, write_i16);
impl_scalar!(i32, u32, 4, read_i32, write_i32);
impl_scalar!(i64, u64, 8, read_i64, write_i64);

// Single bytes have no order.
macro_rules! impl_byte_scalar {
    ($type:ty) => {
        impl Scalar for $type {
            type Bytes = [u8; 1];
            const SIZE: usize = 1;
            const NAME: &'static str = stringify!($type);

            #[inline]
            fn read_ordered<O: ByteOrder>(buf: &[u8]) -> Self {
                buf[0] as $type
            }

            #[inline]
            fn write_ordered<O: ByteOrder>(self, buf: &mut [u8]) {
                buf[0] = self as u8;
            }

            #[inline]
            fn to_ne_bytes(self) -> Self::Bytes {
                [self as u8]
            }

            #[inline]
            fn from_ne_bytes(bytes: Self::Bytes) -> Self {
                bytes[0] as $type
            }

            #[inline]
            fn to_bits(self) -> u64 {
                self as u8 as u64
            }
        }
    };
}

impl_byte_scalar!(u8);
impl_byte_scalar!(i8);

/// Integer `T` stored in byte order `O`.
#[repr(transparent)]
pub struct Endian<T: Scalar, O: ByteOrder> {
    repr: T,
    _order: PhantomData<O>,
}

impl<T: Scalar, O: ByteOrder> Endian<T, O> {
    /// Stores a host-native value.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            repr: value.reorder::<O>(),
            _order: PhantomData,
        }
    }

    /// Returns the host-native value.
    #[inline]
    pub fn get(&self) -> T {
        self.repr.reorder::<O>()
    }

    /// Replaces the stored value.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.repr = value.reorder::<O>();
    }

    /// In-memory bytes, which are the value in order `O`.
    #[inline]
    pub fn to_bytes(&self) -> T::Bytes {
        self.repr.to_ne_bytes()
    }

    /// Reads a value laid out in order `O` from the front of `buf`.
    ///
    /// `buf` must hold at least `T::SIZE` bytes.
    #[inline]
    pub fn from_slice(buf: &[u8]) -> Self {
        Self::new(T::read_ordered::<O>(buf))
    }

    /// Writes the value in order `O` to the front of `buf`.
    #[inline]
    pub fn write_to(&self, buf: &mut [u8]) {
        self.get().write_ordered::<O>(buf)
    }
}

impl<T: Scalar, O: ByteOrder> Clone for Endian<T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Scalar, O: ByteOrder> Copy for Endian<T, O> {}

impl<T: Scalar, O: ByteOrder> Default for Endian<T, O> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Scalar, O: ByteOrder> From<T> for Endian<T, O> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Scalar, O: ByteOrder, P: ByteOrder> PartialEq<Endian<T, P>> for Endian<T, O> {
    fn eq(&self, other: &Endian<T, P>) -> bool {
        self.get() == other.get()
    }
}

impl<T: Scalar + Eq, O: ByteOrder> Eq for Endian<T, O> {}

impl<T: Scalar, O: ByteOrder> PartialEq<T> for Endian<T, O> {
    fn eq(&self, other: &T) -> bool {
        self.get() == *other
    }
}

impl<T: Scalar, O: ByteOrder> PartialOrd for Endian<T, O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.get().partial_cmp(&other.get())
    }
}

impl<T: Scalar + Hash, O: ByteOrder> Hash for Endian<T, O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl<T: Scalar, O: ByteOrder> fmt::Debug for Endian<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

impl<T: Scalar, O: ByteOrder> fmt::Display for Endian<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.get(), f)
    }
}

pub type BigI8 = i8;
pub type BigI16 = Endian<i16, BigEndian>;
pub type BigI32 = Endian<i32, BigEndian>;
pub type BigI64 = Endian<i64, BigEndian>;

pub type BigU8 = u8;
pub type BigU16 = Endian<u16, BigEndian>;
pub type BigU32 = Endian<u32, BigEndian>;
pub type BigU64 = Endian<u64, BigEndian>;

pub type LittleI8 = i8;
pub type LittleI16 = Endian<i16, LittleEndian>;
pub type LittleI32 = Endian<i32, LittleEndian>;
pub type LittleI64 = Endian<i64, LittleEndian>;

pub type LittleU8 = u8;
pub type LittleU16 = Endian<u16, LittleEndian>;
pub type LittleU32 = Endian<u32, LittleEndian>;
pub type LittleU64 = Endian<u64, LittleEndian>;
