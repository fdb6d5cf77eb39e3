//! Flurry decoder.

use std::collections::BTreeMap;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::flurry::pack::Unpack;
use crate::flurry::tags::{Family, Tag, Width, NIL};
use crate::flurry::value::Value;

/// Default ceiling for any declared length or count (64 MB).
pub const DEFAULT_MAX_LENGTH: usize = 64 * 1024 * 1024;

/// Default ceiling for dynamic value nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest string, blob, ext, array or map length accepted.
    pub max_length: usize,
    /// Deepest nesting accepted when decoding dynamic values or skipping.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// An integer read from any integer tag, before narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    /// From a positive fixnum or a uint tag.
    Unsigned(u64),
    /// From a negative fixnum or an int tag.
    Signed(i64),
}

impl Integer {
    /// Narrows into `T`, failing if the value does not fit.
    pub fn convert<T>(self) -> Result<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        let converted = match self {
            Integer::Unsigned(v) => <T as TryFrom<u64>>::try_from(v).ok(),
            Integer::Signed(v) => <T as TryFrom<i64>>::try_from(v).ok(),
        };
        converted.ok_or_else(|| Error::IntegerOverflow {
            value: self.widen(),
            target: std::any::type_name::<T>(),
        })
    }

    /// The value as a 128-bit integer.
    pub fn widen(self) -> i128 {
        match self {
            Integer::Unsigned(v) => v as i128,
            Integer::Signed(v) => v as i128,
        }
    }
}

/// Reader decodes flurry data from a binary buffer.
///
/// The cursor only moves forward. [`Reader::peek`] and
/// [`Reader::maybe_unpack_nil`] are the only lookahead.
pub struct Reader<'a> {
    buffer: &'a [u8],
    pos: usize,
    limits: Limits,
    depth: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_limits(data, Limits::default())
    }

    /// Creates a new reader with explicit decoding limits.
    pub fn with_limits(data: &'a [u8], limits: Limits) -> Self {
        Self {
            buffer: data,
            pos: 0,
            limits,
            depth: 0,
        }
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Returns true if there is more data to read.
    pub fn has_more(&self) -> bool {
        self.pos < self.buffer.len()
    }

    /// Checks if there are enough bytes available.
    fn check_available(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(Error::sudden_eof(needed, self.remaining()));
        }
        Ok(())
    }

    fn check_length(&self, len: usize) -> Result<usize> {
        if len > self.limits.max_length {
            return Err(Error::LengthExceeded {
                found: len,
                max: self.limits.max_length,
            });
        }
        Ok(len)
    }

    /// Returns the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.buffer.get(self.pos).copied()
    }

    /// Consumes a nil tag if one is next and returns true; otherwise
    /// leaves the input untouched and returns false.
    pub fn maybe_unpack_nil(&mut self) -> bool {
        if self.peek() == Some(NIL) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.check_available(1)?;
        let value = self.buffer[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Reads raw payload bytes.
    pub fn unpack_raw(&mut self, length: usize) -> Result<&'a [u8]> {
        self.check_available(length)?;
        let bytes = &self.buffer[self.pos..self.pos + length];
        self.pos += length;
        Ok(bytes)
    }

    /// Skips raw payload bytes.
    pub fn skip_raw(&mut self, length: usize) -> Result<()> {
        self.check_available(length)?;
        self.pos += length;
        Ok(())
    }

    fn read_width(&mut self, width: Width) -> Result<u64> {
        let bytes = self.unpack_raw(width.bytes())?;
        Ok(match width {
            Width::One => bytes[0] as u64,
            Width::Two => BigEndian::read_u16(bytes) as u64,
            Width::Four => BigEndian::read_u32(bytes) as u64,
            Width::Eight => BigEndian::read_u64(bytes),
        })
    }

    fn read_length(&mut self, width: Width) -> Result<usize> {
        let len = self.read_width(width)?;
        let len = usize::try_from(len).map_err(|_| Error::LengthExceeded {
            found: usize::MAX,
            max: self.limits.max_length,
        })?;
        self.check_length(len)
    }

    /// Reads and classifies the next tag byte.
    pub fn read_tag(&mut self) -> Result<Tag> {
        Tag::classify(self.read_byte()?)
    }

    pub fn unpack_nil(&mut self) -> Result<()> {
        let byte = self.read_byte()?;
        match Tag::classify(byte)? {
            Tag::Nil => Ok(()),
            _ => Err(Error::unexpected(byte, "nil")),
        }
    }

    pub fn unpack_bool(&mut self) -> Result<bool> {
        let byte = self.read_byte()?;
        match Tag::classify(byte)? {
            Tag::Bool(value) => Ok(value),
            _ => Err(Error::unexpected(byte, "bool")),
        }
    }

    /// Reads any integer tag without narrowing.
    pub fn unpack_integer(&mut self) -> Result<Integer> {
        let byte = self.read_byte()?;
        let value = match Tag::classify(byte)? {
            Tag::PositiveFixnum(v) => Integer::Unsigned(v as u64),
            Tag::NegativeFixnum(v) => Integer::Signed(v as i64),
            Tag::UInt(width) => Integer::Unsigned(self.read_width(width)?),
            Tag::Int(width) => {
                let raw = self.read_width(width)?;
                Integer::Signed(match width {
                    Width::One => raw as u8 as i8 as i64,
                    Width::Two => raw as u16 as i16 as i64,
                    Width::Four => raw as u32 as i32 as i64,
                    Width::Eight => raw as i64,
                })
            }
            _ => return Err(Error::unexpected(byte, "integer")),
        };
        Ok(value)
    }

    /// Reads any integer tag whose value fits `T`.
    pub fn unpack_int<T>(&mut self) -> Result<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        self.unpack_integer()?.convert()
    }

    pub fn unpack_u8(&mut self) -> Result<u8> {
        self.unpack_int()
    }

    pub fn unpack_u16(&mut self) -> Result<u16> {
        self.unpack_int()
    }

    pub fn unpack_u32(&mut self) -> Result<u32> {
        self.unpack_int()
    }

    pub fn unpack_u64(&mut self) -> Result<u64> {
        self.unpack_int()
    }

    pub fn unpack_i8(&mut self) -> Result<i8> {
        self.unpack_int()
    }

    pub fn unpack_i16(&mut self) -> Result<i16> {
        self.unpack_int()
    }

    pub fn unpack_i32(&mut self) -> Result<i32> {
        self.unpack_int()
    }

    pub fn unpack_i64(&mut self) -> Result<i64> {
        self.unpack_int()
    }

    /// Reads a float32, or a float64 that is exactly representable as f32.
    pub fn unpack_f32(&mut self) -> Result<f32> {
        let byte = self.read_byte()?;
        match Tag::classify(byte)? {
            Tag::Float32 => Ok(BigEndian::read_f32(self.unpack_raw(4)?)),
            Tag::Float64 => {
                let wide = BigEndian::read_f64(self.unpack_raw(8)?);
                let narrow = wide as f32;
                if narrow as f64 == wide || wide.is_nan() {
                    Ok(narrow)
                } else {
                    Err(Error::unexpected(byte, "float32"))
                }
            }
            _ => Err(Error::unexpected(byte, "float")),
        }
    }

    /// Reads a float32 or float64.
    pub fn unpack_f64(&mut self) -> Result<f64> {
        let byte = self.read_byte()?;
        match Tag::classify(byte)? {
            Tag::Float32 => Ok(BigEndian::read_f32(self.unpack_raw(4)?) as f64),
            Tag::Float64 => Ok(BigEndian::read_f64(self.unpack_raw(8)?)),
            _ => Err(Error::unexpected(byte, "float")),
        }
    }

    /// Reads a string, borrowing from the input.
    pub fn unpack_str(&mut self) -> Result<&'a str> {
        let byte = self.read_byte()?;
        let len = match Tag::classify(byte)? {
            Tag::FixStr(len) => len,
            Tag::Str(width) => self.read_length(width)?,
            _ => return Err(Error::unexpected(byte, "string")),
        };
        let bytes = self.unpack_raw(len)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    pub fn unpack_string(&mut self) -> Result<String> {
        self.unpack_str().map(str::to_owned)
    }

    /// Reads a blob, borrowing from the input.
    pub fn unpack_blob(&mut self) -> Result<&'a [u8]> {
        let byte = self.read_byte()?;
        let len = match Tag::classify(byte)? {
            Tag::Bin(width) => self.read_length(width)?,
            _ => return Err(Error::unexpected(byte, "blob")),
        };
        self.unpack_raw(len)
    }

    pub fn unpack_bytes(&mut self) -> Result<Bytes> {
        self.unpack_blob().map(Bytes::copy_from_slice)
    }

    /// Reads an array header and returns the element count.
    pub fn unpack_array_header(&mut self) -> Result<usize> {
        let byte = self.read_byte()?;
        let len = match Tag::classify(byte)? {
            Tag::FixArray(len) => len,
            Tag::Array(width) => self.read_length(width)?,
            _ => return Err(Error::unexpected(byte, "array")),
        };
        // Every element takes at least one byte.
        self.check_available(len)?;
        Ok(len)
    }

    /// Reads a map header and returns the pair count.
    pub fn unpack_map_header(&mut self) -> Result<usize> {
        let byte = self.read_byte()?;
        let len = match Tag::classify(byte)? {
            Tag::FixMap(len) => len,
            Tag::Map(width) => self.read_length(width)?,
            _ => return Err(Error::unexpected(byte, "map")),
        };
        self.check_available(len.saturating_mul(2))?;
        Ok(len)
    }

    /// Reads an ext header and returns the ext type and payload length.
    pub fn unpack_ext_header(&mut self) -> Result<(i8, usize)> {
        let byte = self.read_byte()?;
        let len = match Tag::classify(byte)? {
            Tag::FixExt(len) => len,
            Tag::Ext(width) => self.read_length(width)?,
            _ => return Err(Error::unexpected(byte, "ext")),
        };
        let ext_type = self.read_byte()? as i8;
        Ok((ext_type, len))
    }

    /// Reads a complete ext value.
    pub fn unpack_ext(&mut self) -> Result<(i8, &'a [u8])> {
        let (ext_type, len) = self.unpack_ext_header()?;
        Ok((ext_type, self.unpack_raw(len)?))
    }

    /// Decodes any packable type.
    pub fn unpack<T: Unpack>(&mut self) -> Result<T> {
        T::unpack(self)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.limits.max_depth {
            return Err(Error::DepthExceeded(self.depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// Decodes one value of whatever type the next tag announces.
    ///
    /// Integers come back as [`Value::I64`] or [`Value::U64`] regardless of
    /// the width they were written with.
    pub fn unpack_value(&mut self) -> Result<Value> {
        self.enter()?;
        let value = self.unpack_value_inner();
        self.depth -= 1;
        value
    }

    fn unpack_value_inner(&mut self) -> Result<Value> {
        let byte = self.peek().ok_or_else(|| Error::sudden_eof(1, 0))?;
        let tag = Tag::classify(byte)?;
        let value = match tag.family() {
            Family::Nil => {
                self.unpack_nil()?;
                Value::Nil
            }
            Family::Bool => Value::Bool(self.unpack_bool()?),
            Family::Int => match self.unpack_integer()? {
                Integer::Unsigned(v) => Value::U64(v),
                Integer::Signed(v) => Value::I64(v),
            },
            Family::Float => match tag {
                Tag::Float32 => Value::F32(self.unpack_f32()?),
                _ => Value::F64(self.unpack_f64()?),
            },
            Family::Str => Value::String(self.unpack_string()?),
            Family::Bin => Value::Blob(self.unpack_bytes()?),
            Family::Ext => {
                let (ext_type, data) = self.unpack_ext()?;
                Value::Ext(ext_type, Bytes::copy_from_slice(data))
            }
            Family::Array => {
                let len = self.unpack_array_header()?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.unpack_value()?);
                }
                Value::Array(items)
            }
            Family::Map => {
                let len = self.unpack_map_header()?;
                let mut entries = BTreeMap::new();
                for _ in 0..len {
                    let key_byte = self.peek().ok_or_else(|| Error::sudden_eof(1, 0))?;
                    if Tag::classify(key_byte)?.family() != Family::Str {
                        return Err(Error::unexpected(key_byte, "string map key"));
                    }
                    let key = self.unpack_string()?;
                    let item = self.unpack_value()?;
                    entries.insert(key, item);
                }
                Value::Map(entries)
            }
        };
        Ok(value)
    }

    /// Skips one complete value, including nested elements.
    pub fn skip_value(&mut self) -> Result<()> {
        self.enter()?;
        let result = self.skip_value_inner();
        self.depth -= 1;
        result
    }

    fn skip_value_inner(&mut self) -> Result<()> {
        match self.read_tag()? {
            Tag::PositiveFixnum(_) | Tag::NegativeFixnum(_) | Tag::Nil | Tag::Bool(_) => Ok(()),
            Tag::FixStr(len) => self.skip_raw(len),
            Tag::Str(width) | Tag::Bin(width) => {
                let len = self.read_length(width)?;
                self.skip_raw(len)
            }
            Tag::FixExt(len) => self.skip_raw(len + 1),
            Tag::Ext(width) => {
                let len = self.read_length(width)?;
                self.skip_raw(len + 1)
            }
            Tag::Float32 => self.skip_raw(4),
            Tag::Float64 => self.skip_raw(8),
            Tag::UInt(width) | Tag::Int(width) => self.skip_raw(width.bytes()),
            Tag::FixArray(len) => self.skip_values(len),
            Tag::Array(width) => {
                let len = self.read_length(width)?;
                self.skip_values(len)
            }
            Tag::FixMap(len) => self.skip_values(len * 2),
            Tag::Map(width) => {
                let len = self.read_length(width)?;
                self.skip_values(len.saturating_mul(2))
            }
        }
    }

    fn skip_values(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.skip_value()?;
        }
        Ok(())
    }
}
