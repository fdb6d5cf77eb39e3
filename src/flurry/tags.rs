//! Tag byte constants and classification for the flurry wire format.

use crate::error::{Error, Result};

pub const POSITIVE_FIXNUM_MAX: u8 = 0x7f;
pub const FIXMAP: u8 = 0x80;
pub const FIXARRAY: u8 = 0x90;
pub const FIXSTR: u8 = 0xa0;
pub const NIL: u8 = 0xc0;
/// Reserved; never valid on the wire.
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;
pub const NEGATIVE_FIXNUM: u8 = 0xe0;

/// Smallest value a negative fixnum can hold.
pub const NEGATIVE_FIXNUM_MIN: i64 = -32;

/// Longest string that fits a fixstr tag.
pub const FIXSTR_MAX: usize = 31;

/// Largest count that fits a fixarray or fixmap tag.
pub const FIXCOUNT_MAX: usize = 15;

/// Width of an explicit length or count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    One,
    Two,
    Four,
    Eight,
}

impl Width {
    /// Number of bytes in the prefix.
    pub fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
            Width::Eight => 8,
        }
    }
}

/// Logical type of a tag, used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Bin,
    Ext,
    Array,
    Map,
}

impl Family {
    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Family::Nil => "nil",
            Family::Bool => "bool",
            Family::Int => "integer",
            Family::Float => "float",
            Family::Str => "string",
            Family::Bin => "blob",
            Family::Ext => "ext",
            Family::Array => "array",
            Family::Map => "map",
        }
    }
}

/// A classified tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Value 0..=127 stored in the tag itself.
    PositiveFixnum(u8),
    /// Value -32..=-1 stored in the tag itself.
    NegativeFixnum(i8),
    /// Map with the pair count in the low nibble.
    FixMap(usize),
    /// Array with the element count in the low nibble.
    FixArray(usize),
    /// String with the byte length in the low five bits.
    FixStr(usize),
    Nil,
    Bool(bool),
    Bin(Width),
    Ext(Width),
    Float32,
    Float64,
    UInt(Width),
    Int(Width),
    /// Ext with a fixed payload length of 1, 2, 4, 8 or 16 bytes.
    FixExt(usize),
    Str(Width),
    Array(Width),
    Map(Width),
}

impl Tag {
    /// Classifies a tag byte against the tag-space partition.
    pub fn classify(byte: u8) -> Result<Tag> {
        let tag = match byte {
            0x00..=POSITIVE_FIXNUM_MAX => Tag::PositiveFixnum(byte),
            0x80..=0x8f => Tag::FixMap((byte & 0x0f) as usize),
            0x90..=0x9f => Tag::FixArray((byte & 0x0f) as usize),
            0xa0..=0xbf => Tag::FixStr((byte & 0x1f) as usize),
            NIL => Tag::Nil,
            NEVER_USED => return Err(Error::InvalidTag(byte)),
            FALSE => Tag::Bool(false),
            TRUE => Tag::Bool(true),
            BIN8 => Tag::Bin(Width::One),
            BIN16 => Tag::Bin(Width::Two),
            BIN32 => Tag::Bin(Width::Four),
            EXT8 => Tag::Ext(Width::One),
            EXT16 => Tag::Ext(Width::Two),
            EXT32 => Tag::Ext(Width::Four),
            FLOAT32 => Tag::Float32,
            FLOAT64 => Tag::Float64,
            UINT8 => Tag::UInt(Width::One),
            UINT16 => Tag::UInt(Width::Two),
            UINT32 => Tag::UInt(Width::Four),
            UINT64 => Tag::UInt(Width::Eight),
            INT8 => Tag::Int(Width::One),
            INT16 => Tag::Int(Width::Two),
            INT32 => Tag::Int(Width::Four),
            INT64 => Tag::Int(Width::Eight),
            FIXEXT1 => Tag::FixExt(1),
            FIXEXT2 => Tag::FixExt(2),
            FIXEXT4 => Tag::FixExt(4),
            FIXEXT8 => Tag::FixExt(8),
            FIXEXT16 => Tag::FixExt(16),
            STR8 => Tag::Str(Width::One),
            STR16 => Tag::Str(Width::Two),
            STR32 => Tag::Str(Width::Four),
            ARRAY16 => Tag::Array(Width::Two),
            ARRAY32 => Tag::Array(Width::Four),
            MAP16 => Tag::Map(Width::Two),
            MAP32 => Tag::Map(Width::Four),
            NEGATIVE_FIXNUM..=0xff => Tag::NegativeFixnum(byte as i8),
        };
        Ok(tag)
    }

    /// Logical type of the tag.
    pub fn family(self) -> Family {
        match self {
            Tag::PositiveFixnum(_) | Tag::NegativeFixnum(_) | Tag::UInt(_) | Tag::Int(_) => {
                Family::Int
            }
            Tag::FixMap(_) | Tag::Map(_) => Family::Map,
            Tag::FixArray(_) | Tag::Array(_) => Family::Array,
            Tag::FixStr(_) | Tag::Str(_) => Family::Str,
            Tag::Nil => Family::Nil,
            Tag::Bool(_) => Family::Bool,
            Tag::Bin(_) => Family::Bin,
            Tag::Ext(_) | Tag::FixExt(_) => Family::Ext,
            Tag::Float32 | Tag::Float64 => Family::Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_fixed_ranges() {
        assert_eq!(Tag::classify(0x00).unwrap(), Tag::PositiveFixnum(0));
        assert_eq!(Tag::classify(0x7f).unwrap(), Tag::PositiveFixnum(127));
        assert_eq!(Tag::classify(0x83).unwrap(), Tag::FixMap(3));
        assert_eq!(Tag::classify(0x9f).unwrap(), Tag::FixArray(15));
        assert_eq!(Tag::classify(0xa5).unwrap(), Tag::FixStr(5));
        assert_eq!(Tag::classify(0xbf).unwrap(), Tag::FixStr(31));
        assert_eq!(Tag::classify(0xe0).unwrap(), Tag::NegativeFixnum(-32));
        assert_eq!(Tag::classify(0xff).unwrap(), Tag::NegativeFixnum(-1));
    }

    #[test]
    fn test_classify_explicit_tags() {
        assert_eq!(Tag::classify(NIL).unwrap(), Tag::Nil);
        assert_eq!(Tag::classify(TRUE).unwrap(), Tag::Bool(true));
        assert_eq!(Tag::classify(UINT16).unwrap(), Tag::UInt(Width::Two));
        assert_eq!(Tag::classify(INT64).unwrap(), Tag::Int(Width::Eight));
        assert_eq!(Tag::classify(FIXEXT16).unwrap(), Tag::FixExt(16));
        assert_eq!(Tag::classify(MAP32).unwrap(), Tag::Map(Width::Four));
    }

    #[test]
    fn test_classify_never_used() {
        assert!(matches!(Tag::classify(NEVER_USED), Err(Error::InvalidTag(0xc1))));
    }

    #[test]
    fn test_every_byte_but_one_classifies() {
        let invalid = (0u8..=255).filter(|b| Tag::classify(*b).is_err()).count();
        assert_eq!(invalid, 1);
    }

    #[test]
    fn test_family() {
        assert_eq!(Tag::NegativeFixnum(-3).family(), Family::Int);
        assert_eq!(Tag::FixExt(4).family(), Family::Ext);
        assert_eq!(Tag::FixStr(0).family().name(), "string");
    }
}
