//! Bounds-checked cursors over caller-owned buffers.

use crate::endian::{ByteOrder, LittleEndian, Scalar};
use crate::error::{Error, Result};

/// Largest element count a length-prefixed field can carry.
pub const MAX_COUNT: usize = u16::MAX as usize;

/// Forward-only cursor over an input slice.
pub struct ReadCursor<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            pos: 0,
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

    /// Consumes `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::buffer_underflow(len, self.remaining()));
        }
        let bytes = &self.buffer[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consumes everything that is left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let bytes = &self.buffer[self.pos..];
        self.pos = self.buffer.len();
        bytes
    }

    /// Reads a scalar laid out in order `O`.
    pub fn read_scalar<T: Scalar, O: ByteOrder>(&mut self) -> Result<T> {
        self.take(T::SIZE).map(T::read_ordered::<O>)
    }

    /// Reads a little-endian u16 element count.
    pub fn read_count(&mut self) -> Result<usize> {
        self.read_scalar::<u16, LittleEndian>().map(usize::from)
    }

    /// The unread part of the input.
    pub fn into_remainder(self) -> &'a [u8] {
        &self.buffer[self.pos..]
    }
}

/// Forward-only cursor over an output slice.
pub struct WriteCursor<'a> {
    buffer: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the space left in the destination.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.pos
    }

    /// Reserves `len` bytes and returns them for filling.
    pub fn reserve(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.remaining() {
            return Err(Error::buffer_overflow(len, self.remaining()));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buffer[start..start + len])
    }

    /// Copies `data` into the destination.
    pub fn put(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Writes a scalar in order `O`.
    pub fn write_scalar<T: Scalar, O: ByteOrder>(&mut self, value: T) -> Result<()> {
        value.write_ordered::<O>(self.reserve(T::SIZE)?);
        Ok(())
    }

    /// Writes a little-endian u16 element count.
    pub fn write_count(&mut self, len: usize) -> Result<()> {
        let count = u16::try_from(len).map_err(|_| Error::UnsupportedSize {
            size: len,
            max: MAX_COUNT,
        })?;
        self.write_scalar::<u16, LittleEndian>(count)
    }

    /// The unwritten part of the destination.
    pub fn into_remainder(self) -> &'a mut [u8] {
        let WriteCursor { buffer, pos } = self;
        &mut buffer[pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::BigEndian;

    #[test]
    fn test_read_cursor_bounds() {
        let data = [1, 2, 3];
        let mut cursor = ReadCursor::new(&data);
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert!(matches!(
            cursor.take(2),
            Err(Error::BufferUnderflow { needed: 2, available: 1 })
        ));
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.take_rest(), &[3]);
        assert_eq!(cursor.take_rest(), &[] as &[u8]);
    }

    #[test]
    fn test_scalar_orders() {
        let data = [0x12, 0x34];
        let mut cursor = ReadCursor::new(&data);
        assert_eq!(cursor.read_scalar::<u16, BigEndian>().unwrap(), 0x1234);
        let mut cursor = ReadCursor::new(&data);
        assert_eq!(cursor.read_scalar::<u16, LittleEndian>().unwrap(), 0x3412);
    }

    #[test]
    fn test_write_cursor_overflow() {
        let mut buffer = [0u8; 3];
        let mut cursor = WriteCursor::new(&mut buffer);
        cursor.write_scalar::<u16, LittleEndian>(0xbeef).unwrap();
        assert!(matches!(
            cursor.write_scalar::<u16, LittleEndian>(1),
            Err(Error::BufferOverflow { needed: 2, available: 1 })
        ));
        assert_eq!(cursor.into_remainder().len(), 1);
        assert_eq!(buffer, [0xef, 0xbe, 0]);
    }

    #[test]
    fn test_count_ceiling() {
        let mut buffer = [0u8; 2];
        let mut cursor = WriteCursor::new(&mut buffer);
        assert!(matches!(
            cursor.write_count(70000),
            Err(Error::UnsupportedSize { size: 70000, max: MAX_COUNT })
        ));
        cursor.write_count(MAX_COUNT).unwrap();
    }
}
