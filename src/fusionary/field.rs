//! The [`Field`] trait and its implementations for plain types.

use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::endian::{ByteOrder, Endian, LittleEndian, Scalar};
use crate::error::{Error, Result};
use crate::fusionary::cursor::{ReadCursor, WriteCursor};

/// Flag values of the already-visited fields of one record, by field index.
///
/// Fields that are not flag fields occupy a slot holding `None`.
#[derive(Debug, Clone, Default)]
pub struct FlagContext {
    flags: Vec<Option<u64>>,
}

impl FlagContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the flag bits of the next field.
    pub fn push(&mut self, bits: Option<u64>) {
        self.flags.push(bits);
    }

    /// Bits of the flag field at `index`.
    pub fn flag(&self, index: usize) -> Result<u64> {
        self.flags
            .get(index)
            .copied()
            .flatten()
            .ok_or(Error::MissingFlag(index))
    }

    /// Number of fields visited so far.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// A value with a fixed, declared binary layout.
pub trait Field: Sized {
    /// Set for fields that consume the remainder of the input.
    const TRAILING: bool = false;

    /// Reads the field. `flags` holds the earlier fields of the enclosing record.
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self>;

    /// Writes the field. `flags` holds the earlier fields of the enclosing record.
    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()>;

    /// Exact number of bytes `write_field` produces.
    fn encoded_len(&self) -> usize;

    /// Bits later fields may reference; `None` unless this is a flag field.
    fn flag_bits(&self) -> Option<u64> {
        None
    }

    /// Renders the value for [`pretty_print`](crate::fusionary::pretty_print).
    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Integer values usable as flag fields and markers.
pub trait FlagValue: Field + Copy {
    /// Raw bits, zero-extended.
    fn to_flag(&self) -> u64;

    /// Value from raw bits, truncated to the width of the type.
    fn from_flag(bits: u64) -> Self;
}

// Bare integers are little-endian on the wire.
macro_rules! impl_integer {
    ($($type:ty),*) => {
        $(
            impl Field for $type {
                #[inline]
                fn read_field(cursor: &mut ReadCursor<'_>, _: &FlagContext) -> Result<Self> {
                    cursor.read_scalar::<$type, LittleEndian>()
                }

                #[inline]
                fn write_field(&self, cursor: &mut WriteCursor<'_>, _: &FlagContext) -> Result<()> {
                    cursor.write_scalar::<$type, LittleEndian>(*self)
                }

                #[inline]
                fn encoded_len(&self) -> usize {
                    <$type as Scalar>::SIZE
                }

                fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self)
                }
            }

            impl FlagValue for $type {
                #[inline]
                fn to_flag(&self) -> u64 {
                    self.to_bits()
                }

                #[inline]
                fn from_flag(bits: u64) -> Self {
                    bits as $type
                }
            }
        )*
    };
}

impl_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

impl<T: Scalar, O: ByteOrder> Field for Endian<T, O> {
    #[inline]
    fn read_field(cursor: &mut ReadCursor<'_>, _: &FlagContext) -> Result<Self> {
        cursor.read_scalar::<T, O>().map(Endian::new)
    }

    #[inline]
    fn write_field(&self, cursor: &mut WriteCursor<'_>, _: &FlagContext) -> Result<()> {
        cursor.write_scalar::<T, O>(self.get())
    }

    #[inline]
    fn encoded_len(&self) -> usize {
        T::SIZE
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl<T: Scalar + FlagValue, O: ByteOrder> FlagValue for Endian<T, O> {
    fn to_flag(&self) -> u64 {
        self.get().to_flag()
    }

    fn from_flag(bits: u64) -> Self {
        Endian::new(T::from_flag(bits))
    }
}

impl Field for bool {
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        match u8::read_field(cursor, flags)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidBool(other)),
        }
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        (*self as u8).write_field(cursor, flags)
    }

    fn encoded_len(&self) -> usize {
        1
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Strings carry a u16 byte count.
impl Field for String {
    fn read_field(cursor: &mut ReadCursor<'_>, _: &FlagContext) -> Result<Self> {
        let len = cursor.read_count()?;
        let bytes = cursor.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8)
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, _: &FlagContext) -> Result<()> {
        cursor.write_count(self.len())?;
        cursor.put(self.as_bytes())
    }

    fn encoded_len(&self) -> usize {
        2 + self.len()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

/// Sequences carry a u16 element count.
impl<T: Field> Field for Vec<T> {
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        let len = cursor.read_count()?;
        let mut items = Vec::with_capacity(len.min(cursor.remaining()));
        for _ in 0..len {
            items.push(T::read_field(cursor, flags)?);
        }
        Ok(items)
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        cursor.write_count(self.len())?;
        for item in self {
            item.write_field(cursor, flags)?;
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2 + self.iter().map(Field::encoded_len).sum::<usize>()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_list(f, self.iter())
    }
}

/// Maps carry a u16 pair count.
impl<K, V, S> Field for HashMap<K, V, S>
where
    K: Field + Eq + Hash,
    V: Field,
    S: BuildHasher + Default,
{
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        let len = cursor.read_count()?;
        let mut map = HashMap::with_capacity_and_hasher(len.min(cursor.remaining()), S::default());
        for _ in 0..len {
            let key = K::read_field(cursor, flags)?;
            let value = V::read_field(cursor, flags)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        cursor.write_count(self.len())?;
        for (key, value) in self {
            key.write_field(cursor, flags)?;
            value.write_field(cursor, flags)?;
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        2 + self
            .iter()
            .map(|(k, v)| k.encoded_len() + v.encoded_len())
            .sum::<usize>()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            key.print_field(f)?;
            f.write_str(":")?;
            value.print_field(f)?;
        }
        f.write_str("}")
    }
}

/// Fixed-size arrays have no count prefix.
impl<T: Field, const N: usize> Field for [T; N] {
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::read_field(cursor, flags)?);
        }
        items.try_into().map_err(|items: Vec<T>| Error::ArrayLength {
            expected: N,
            found: items.len(),
        })
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        for item in self {
            item.write_field(cursor, flags)?;
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.iter().map(Field::encoded_len).sum()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_list(f, self.iter())
    }
}

fn print_list<'a, T: Field + 'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.print_field(f)?;
    }
    f.write_str("]")
}
