//! Flurry encoder.

use crate::error::{Error, Result};
use crate::flurry::pack::Pack;
use crate::flurry::tags::*;
use crate::flurry::value::Value;

const INITIAL_CAPACITY: usize = 256;

/// Largest length any prefix can carry.
const MAX_LENGTH: usize = u32::MAX as usize;

/// Writer encodes flurry values into a binary buffer.
///
/// Every `pack_*` method picks the shortest tag that represents the value
/// exactly.
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    /// Creates a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Returns the current length of the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the encoded bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Resets the writer for reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Encodes any packable value.
    pub fn pack<T: Pack + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.pack(self)
    }

    /// Writes raw bytes with no tag.
    pub fn pack_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    pub fn pack_nil(&mut self) -> Result<()> {
        self.buffer.push(NIL);
        Ok(())
    }

    pub fn pack_true(&mut self) -> Result<()> {
        self.buffer.push(TRUE);
        Ok(())
    }

    pub fn pack_false(&mut self) -> Result<()> {
        self.buffer.push(FALSE);
        Ok(())
    }

    pub fn pack_bool(&mut self, value: bool) -> Result<()> {
        if value {
            self.pack_true()
        } else {
            self.pack_false()
        }
    }

    /// Writes an unsigned integer using the smallest fitting class.
    pub fn pack_unsigned(&mut self, value: u64) -> Result<()> {
        if value <= POSITIVE_FIXNUM_MAX as u64 {
            self.buffer.push(value as u8);
        } else if value <= u8::MAX as u64 {
            self.buffer.push(UINT8);
            self.buffer.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.buffer.push(UINT16);
            self.buffer.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.buffer.push(UINT32);
            self.buffer.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buffer.push(UINT64);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
        Ok(())
    }

    /// Writes a signed integer using the smallest fitting class.
    ///
    /// Non-negative values are written exactly as the same unsigned value;
    /// only negative values use the signed tags.
    pub fn pack_signed(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.pack_unsigned(value as u64);
        }
        if value >= NEGATIVE_FIXNUM_MIN {
            self.buffer.push(value as i8 as u8);
        } else if value >= i8::MIN as i64 {
            self.buffer.push(INT8);
            self.buffer.push(value as i8 as u8);
        } else if value >= i16::MIN as i64 {
            self.buffer.push(INT16);
            self.buffer.extend_from_slice(&(value as i16).to_be_bytes());
        } else if value >= i32::MIN as i64 {
            self.buffer.push(INT32);
            self.buffer.extend_from_slice(&(value as i32).to_be_bytes());
        } else {
            self.buffer.push(INT64);
            self.buffer.extend_from_slice(&value.to_be_bytes());
        }
        Ok(())
    }

    pub fn pack_u8(&mut self, value: u8) -> Result<()> {
        self.pack_unsigned(value as u64)
    }

    pub fn pack_u16(&mut self, value: u16) -> Result<()> {
        self.pack_unsigned(value as u64)
    }

    pub fn pack_u32(&mut self, value: u32) -> Result<()> {
        self.pack_unsigned(value as u64)
    }

    pub fn pack_u64(&mut self, value: u64) -> Result<()> {
        self.pack_unsigned(value)
    }

    pub fn pack_i8(&mut self, value: i8) -> Result<()> {
        self.pack_signed(value as i64)
    }

    pub fn pack_i16(&mut self, value: i16) -> Result<()> {
        self.pack_signed(value as i64)
    }

    pub fn pack_i32(&mut self, value: i32) -> Result<()> {
        self.pack_signed(value as i64)
    }

    pub fn pack_i64(&mut self, value: i64) -> Result<()> {
        self.pack_signed(value)
    }

    /// Writes a 32-bit float (always the float32 tag).
    pub fn pack_f32(&mut self, value: f32) -> Result<()> {
        self.buffer.push(FLOAT32);
        self.buffer.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Writes a 64-bit float (always the float64 tag).
    pub fn pack_f64(&mut self, value: f64) -> Result<()> {
        self.buffer.push(FLOAT64);
        self.buffer.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Writes a blob: bin8/16/32 header followed by the bytes.
    pub fn pack_blob(&mut self, data: &[u8]) -> Result<()> {
        self.pack_blob_header(data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Writes only the blob header; the caller supplies `len` bytes next.
    pub fn pack_blob_header(&mut self, len: usize) -> Result<()> {
        self.write_length(len, [BIN8, BIN16, BIN32])
    }

    /// Writes a string: fixstr or str8/16/32 header followed by UTF-8 bytes.
    pub fn pack_str(&mut self, value: &str) -> Result<()> {
        let len = value.len();
        if len <= FIXSTR_MAX {
            self.buffer.push(FIXSTR | len as u8);
        } else {
            self.write_length(len, [STR8, STR16, STR32])?;
        }
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes an array header for `len` elements.
    pub fn pack_array_header(&mut self, len: usize) -> Result<()> {
        if len <= FIXCOUNT_MAX {
            self.buffer.push(FIXARRAY | len as u8);
            Ok(())
        } else {
            self.write_count(len, ARRAY16, ARRAY32)
        }
    }

    /// Writes a map header for `len` key/value pairs.
    pub fn pack_map_header(&mut self, len: usize) -> Result<()> {
        if len <= FIXCOUNT_MAX {
            self.buffer.push(FIXMAP | len as u8);
            Ok(())
        } else {
            self.write_count(len, MAP16, MAP32)
        }
    }

    /// Writes an ext header; the caller writes `len` payload bytes next.
    pub fn pack_ext_header(&mut self, ext_type: i8, len: usize) -> Result<()> {
        match len {
            1 => self.buffer.push(FIXEXT1),
            2 => self.buffer.push(FIXEXT2),
            4 => self.buffer.push(FIXEXT4),
            8 => self.buffer.push(FIXEXT8),
            16 => self.buffer.push(FIXEXT16),
            _ => self.write_length(len, [EXT8, EXT16, EXT32])?,
        }
        self.buffer.push(ext_type as u8);
        Ok(())
    }

    /// Writes a complete ext value.
    pub fn pack_ext(&mut self, ext_type: i8, data: &[u8]) -> Result<()> {
        self.pack_ext_header(ext_type, data.len())?;
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Writes a dynamically typed value.
    pub fn pack_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Nil => self.pack_nil(),
            Value::Bool(v) => self.pack_bool(*v),
            Value::I8(v) => self.pack_i8(*v),
            Value::I16(v) => self.pack_i16(*v),
            Value::I32(v) => self.pack_i32(*v),
            Value::I64(v) => self.pack_i64(*v),
            Value::U8(v) => self.pack_u8(*v),
            Value::U16(v) => self.pack_u16(*v),
            Value::U32(v) => self.pack_u32(*v),
            Value::U64(v) => self.pack_u64(*v),
            Value::F32(v) => self.pack_f32(*v),
            Value::F64(v) => self.pack_f64(*v),
            Value::String(v) => self.pack_str(v),
            Value::Blob(v) => self.pack_blob(v),
            Value::Array(items) => {
                self.pack_array_header(items.len())?;
                for item in items {
                    self.pack_value(item)?;
                }
                Ok(())
            }
            Value::Map(entries) => {
                self.pack_map_header(entries.len())?;
                for (key, item) in entries {
                    self.pack_str(key)?;
                    self.pack_value(item)?;
                }
                Ok(())
            }
            Value::Ext(ext_type, data) => self.pack_ext(*ext_type, data),
        }
    }

    /// Writes a length with the 8, 16 or 32-bit prefix tag from `tags`.
    fn write_length(&mut self, len: usize, tags: [u8; 3]) -> Result<()> {
        if len <= u8::MAX as usize {
            self.buffer.push(tags[0]);
            self.buffer.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.push(tags[1]);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else if len <= MAX_LENGTH {
            self.buffer.push(tags[2]);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        } else {
            return Err(Error::UnsupportedSize {
                size: len,
                max: MAX_LENGTH,
            });
        }
        Ok(())
    }

    /// Writes a container count with the 16 or 32-bit prefix tag.
    fn write_count(&mut self, len: usize, tag16: u8, tag32: u8) -> Result<()> {
        if len <= u16::MAX as usize {
            self.buffer.push(tag16);
            self.buffer.extend_from_slice(&(len as u16).to_be_bytes());
        } else if len <= MAX_LENGTH {
            self.buffer.push(tag32);
            self.buffer.extend_from_slice(&(len as u32).to_be_bytes());
        } else {
            return Err(Error::UnsupportedSize {
                size: len,
                max: MAX_LENGTH,
            });
        }
        Ok(())
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}
