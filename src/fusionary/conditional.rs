//! Flag fields and the fields whose layout they control.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::fusionary::cursor::{ReadCursor, WriteCursor};
use crate::fusionary::field::{Field, FlagContext, FlagValue};

/// An integer field whose bits control later fields of the same record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldFlag<T> {
    pub value: T,
}

impl<T: FlagValue> FieldFlag<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns true if bit `bit` is set.
    pub fn bit(&self, bit: u32) -> bool {
        bit_is_set(self.value.to_flag(), bit)
    }

    /// Sets or clears bit `bit`. Bits past the width of `T` are ignored.
    pub fn set_bit(&mut self, bit: u32, on: bool) {
        let mask = shifted(1, bit);
        let bits = self.value.to_flag();
        let bits = if on { bits | mask } else { bits & !mask };
        self.value = T::from_flag(bits);
    }

    /// Replaces the `width` bits starting at `offset` with `selector`.
    pub fn set_bits(&mut self, offset: u32, width: u32, selector: u64) {
        let mask = shifted(bit_mask(width), offset);
        let bits = (self.value.to_flag() & !mask) | (shifted(selector, offset) & mask);
        self.value = T::from_flag(bits);
    }
}

impl<T: FlagValue> Field for FieldFlag<T> {
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        T::read_field(cursor, flags).map(Self::new)
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        self.value.write_field(cursor, flags)
    }

    fn encoded_len(&self) -> usize {
        self.value.encoded_len()
    }

    fn flag_bits(&self) -> Option<u64> {
        Some(self.value.to_flag())
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.print_field(f)
    }
}

pub(crate) const fn bit_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1 << width) - 1
    }
}

// Shifts that run past bit 63 yield zero instead of overflowing.
const fn shifted(bits: u64, offset: u32) -> u64 {
    match bits.checked_shl(offset) {
        Some(bits) => bits,
        None => 0,
    }
}

const fn selected(bits: u64, offset: u32) -> u64 {
    match bits.checked_shr(offset) {
        Some(bits) => bits,
        None => 0,
    }
}

const fn bit_is_set(bits: u64, bit: u32) -> bool {
    selected(bits, bit) & 1 == 1
}

/// A `T` present only while bit `BIT` of flag field `INDEX` is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OptionalField<T, const INDEX: usize, const BIT: u32>(pub Option<T>);

impl<T, const INDEX: usize, const BIT: u32> OptionalField<T, INDEX, BIT> {
    pub fn some(value: T) -> Self {
        Self(Some(value))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl<T, const INDEX: usize, const BIT: u32> Default for OptionalField<T, INDEX, BIT> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T, const INDEX: usize, const BIT: u32> From<Option<T>> for OptionalField<T, INDEX, BIT> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T, const INDEX: usize, const BIT: u32> Deref for OptionalField<T, INDEX, BIT> {
    type Target = Option<T>;

    fn deref(&self) -> &Option<T> {
        &self.0
    }
}

impl<T, const INDEX: usize, const BIT: u32> DerefMut for OptionalField<T, INDEX, BIT> {
    fn deref_mut(&mut self) -> &mut Option<T> {
        &mut self.0
    }
}

impl<T: Field, const INDEX: usize, const BIT: u32> Field for OptionalField<T, INDEX, BIT> {
    const TRAILING: bool = T::TRAILING;

    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        if bit_is_set(flags.flag(INDEX)?, BIT) {
            T::read_field(cursor, flags).map(Self::some)
        } else {
            Ok(Self::none())
        }
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        let set = bit_is_set(flags.flag(INDEX)?, BIT);
        match (set, &self.0) {
            (true, Some(value)) => value.write_field(cursor, flags),
            (false, None) => Ok(()),
            (true, None) => Err(Error::FlagMismatch {
                index: INDEX,
                reason: "bit is set but the optional field is absent",
            }),
            (false, Some(_)) => Err(Error::FlagMismatch {
                index: INDEX,
                reason: "bit is clear but the optional field is present",
            }),
        }
    }

    fn encoded_len(&self) -> usize {
        self.0.as_ref().map_or(0, Field::encoded_len)
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.print_field(f),
            None => f.write_str("none"),
        }
    }
}

/// A closed set of types for one variant position, declared with
/// [`candidates!`](crate::candidates).
pub trait Candidates: Sized {
    /// Number of declared candidates.
    const COUNT: usize;

    /// Set if any candidate consumes the remainder of the input.
    const TRAILING: bool = false;

    /// Selector value of the active candidate.
    fn selector(&self) -> u64;

    /// Reads the candidate chosen by `selector`.
    fn read_candidate(
        selector: u64,
        cursor: &mut ReadCursor<'_>,
        flags: &FlagContext,
    ) -> Result<Self>;

    /// Writes the active candidate.
    fn write_candidate(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()>;

    /// Encoded size of the active candidate.
    fn candidate_len(&self) -> usize;
}

/// A field whose type is chosen by `(flag >> OFFSET) & mask(BITS)` of flag
/// field `INDEX`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VarsizeField<C, const INDEX: usize, const BITS: u32, const OFFSET: u32> {
    pub value: C,
}

impl<C: Candidates, const INDEX: usize, const BITS: u32, const OFFSET: u32>
    VarsizeField<C, INDEX, BITS, OFFSET>
{
    pub fn new(value: C) -> Self {
        Self { value }
    }

    fn select(flags: &FlagContext) -> Result<u64> {
        let selector = selected(flags.flag(INDEX)?, OFFSET) & bit_mask(BITS);
        if selector >= C::COUNT as u64 {
            return Err(Error::InvalidSelector {
                selector,
                candidates: C::COUNT,
            });
        }
        Ok(selector)
    }
}

impl<C: Candidates, const INDEX: usize, const BITS: u32, const OFFSET: u32> Field
    for VarsizeField<C, INDEX, BITS, OFFSET>
{
    const TRAILING: bool = <C as Candidates>::TRAILING;

    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        let selector = Self::select(flags)?;
        C::read_candidate(selector, cursor, flags).map(Self::new)
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        if Self::select(flags)? != self.value.selector() {
            return Err(Error::FlagMismatch {
                index: INDEX,
                reason: "selector bits do not match the active candidate",
            });
        }
        self.value.write_candidate(cursor, flags)
    }

    fn encoded_len(&self) -> usize {
        self.value.candidate_len()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "varsize_field[{}]", INDEX)
    }
}

/// Placeholder that occupies no bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nothing;

impl Field for Nothing {
    fn read_field(_: &mut ReadCursor<'_>, _: &FlagContext) -> Result<Self> {
        Ok(Nothing)
    }

    fn write_field(&self, _: &mut WriteCursor<'_>, _: &FlagContext) -> Result<()> {
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        0
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("nothing")
    }
}

macro_rules! impl_nothing_into {
    ($($type:ty),*) => {
        $(
            impl From<Nothing> for $type {
                fn from(_: Nothing) -> Self {
                    0
                }
            }
        )*
    };
}

impl_nothing_into!(u8, u16, u32, u64, i8, i16, i32, i64, usize);

/// Everything from the current position to the end of the input.
///
/// Must be the last field of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rest(pub Vec<u8>);

impl Rest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Rest {
    fn from(data: &[u8]) -> Self {
        Rest(data.to_vec())
    }
}

impl From<&str> for Rest {
    fn from(data: &str) -> Self {
        Rest(data.as_bytes().to_vec())
    }
}

impl Field for Rest {
    const TRAILING: bool = true;

    fn read_field(cursor: &mut ReadCursor<'_>, _: &FlagContext) -> Result<Self> {
        Ok(Rest(cursor.take_rest().to_vec()))
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, _: &FlagContext) -> Result<()> {
        cursor.put(&self.0)
    }

    fn encoded_len(&self) -> usize {
        self.0.len()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A constant `V` stored as an `E`, checked on read.
pub struct Marker<E, const V: u64>(PhantomData<E>);

impl<E, const V: u64> Marker<E, V> {
    pub const VALUE: u64 = V;

    pub fn new() -> Self {
        Marker(PhantomData)
    }
}

impl<E, const V: u64> Default for Marker<E, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, const V: u64> Clone for Marker<E, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, const V: u64> Copy for Marker<E, V> {}

impl<E, const V: u64> PartialEq for Marker<E, V> {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl<E, const V: u64> Eq for Marker<E, V> {}

impl<E, const V: u64> fmt::Debug for Marker<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marker({:#x})", V)
    }
}

impl<E: FlagValue, const V: u64> Field for Marker<E, V> {
    fn read_field(cursor: &mut ReadCursor<'_>, flags: &FlagContext) -> Result<Self> {
        let expected = E::from_flag(V).to_flag();
        let found = E::read_field(cursor, flags)?.to_flag();
        if found != expected {
            return Err(Error::MarkerMismatch { expected, found });
        }
        Ok(Self::new())
    }

    fn write_field(&self, cursor: &mut WriteCursor<'_>, flags: &FlagContext) -> Result<()> {
        E::from_flag(V).write_field(cursor, flags)
    }

    fn encoded_len(&self) -> usize {
        E::from_flag(V).encoded_len()
    }

    fn print_field(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::BigU32;

    fn context(bits: &[Option<u64>]) -> FlagContext {
        let mut context = FlagContext::new();
        for b in bits {
            context.push(*b);
        }
        context
    }

    #[test]
    fn test_flag_bits() {
        let mut flag = FieldFlag::new(0u8);
        flag.set_bit(3, true);
        assert!(flag.bit(3));
        assert_eq!(flag.flag_bits(), Some(0x08));
        flag.set_bits(1, 2, 0b11);
        assert_eq!(flag.value, 0b1110);
        flag.set_bits(1, 2, 0b01);
        assert_eq!(flag.value, 0b1010);
        flag.set_bit(3, false);
        assert_eq!(flag.value, 0b0010);
    }

    #[test]
    fn test_flag_bits_past_width() {
        let mut flag = FieldFlag::new(0x81u8);
        flag.set_bit(64, true);
        flag.set_bit(200, false);
        flag.set_bit(8, true);
        assert_eq!(flag.value, 0x81);
        assert!(!flag.bit(64));
        assert!(!flag.bit(u32::MAX));
        flag.set_bits(64, 2, 0b11);
        flag.set_bits(7, 4, 0);
        assert_eq!(flag.value, 0x01);

        let mut wide = FieldFlag::new(0u64);
        wide.set_bit(63, true);
        assert!(wide.bit(63));
        assert_eq!(wide.value, 1 << 63);
    }

    #[test]
    fn test_optional_bit_past_flag_width_is_clear() {
        let data = [0x2a];
        let all = context(&[Some(u64::MAX)]);
        let mut cursor = ReadCursor::new(&data);
        let field = OptionalField::<u8, 0, 64>::read_field(&mut cursor, &all).unwrap();
        assert_eq!(*field, None);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_optional_reads_on_bit() {
        let data = [0x2a, 0x00];
        let set = context(&[Some(0b10)]);
        let clear = context(&[Some(0b01)]);

        let mut cursor = ReadCursor::new(&data);
        let field = OptionalField::<u16, 0, 1>::read_field(&mut cursor, &set).unwrap();
        assert_eq!(*field, Some(42));
        assert_eq!(cursor.remaining(), 0);

        let mut cursor = ReadCursor::new(&data);
        let field = OptionalField::<u16, 0, 1>::read_field(&mut cursor, &clear).unwrap();
        assert_eq!(*field, None);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_optional_flag_mismatch() {
        let mut buffer = [0u8; 2];
        let set = context(&[Some(1)]);
        let field = OptionalField::<u16, 0, 0>::none();
        let err = field
            .write_field(&mut WriteCursor::new(&mut buffer), &set)
            .unwrap_err();
        assert!(matches!(err, Error::FlagMismatch { index: 0, .. }));

        let clear = context(&[Some(0)]);
        let field = OptionalField::<u16, 0, 0>::some(5);
        assert!(field
            .write_field(&mut WriteCursor::new(&mut buffer), &clear)
            .is_err());
    }

    #[test]
    fn test_optional_requires_flag_field() {
        let data = [0u8; 2];
        let not_a_flag = context(&[None]);
        assert!(matches!(
            OptionalField::<u16, 0, 0>::read_field(&mut ReadCursor::new(&data), &not_a_flag),
            Err(Error::MissingFlag(0))
        ));
    }

    #[test]
    fn test_marker() {
        type Magic = Marker<BigU32, 0x5353_5331>;
        let mut buffer = [0u8; 4];
        Magic::new()
            .write_field(&mut WriteCursor::new(&mut buffer), &FlagContext::new())
            .unwrap();
        assert_eq!(&buffer, b"SSS1");
        assert!(Magic::read_field(&mut ReadCursor::new(b"SSS1"), &FlagContext::new()).is_ok());
        assert!(matches!(
            Magic::read_field(&mut ReadCursor::new(b"SSS2"), &FlagContext::new()),
            Err(Error::MarkerMismatch { expected: 0x5353_5331, found: 0x5353_5332 })
        ));
    }

    #[test]
    fn test_rest_and_nothing() {
        let data = [1, 2, 3];
        let mut cursor = ReadCursor::new(&data);
        Nothing::read_field(&mut cursor, &FlagContext::new()).unwrap();
        assert_eq!(cursor.position(), 0);
        let rest = Rest::read_field(&mut cursor, &FlagContext::new()).unwrap();
        assert_eq!(rest.as_bytes(), &data);
        let rest = Rest::read_field(&mut cursor, &FlagContext::new()).unwrap();
        assert!(rest.0.is_empty());
    }
}
