//! Streaming support for flurry blobs.
//!
//! A stream is a plain concatenation of flurry blob values (bin8, bin16 or
//! bin32 tag, big-endian length, payload). Any `std::io::Read` or
//! `std::io::Write` can carry one.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use arsenal::stream::{StreamReader, StreamWriter};
//! use arsenal::flurry::{Reader, Writer};
//! use arsenal::Result;
//!
//! fn main() -> Result<()> {
//!     let mut buffer = Vec::new();
//!     {
//!         let mut stream = StreamWriter::new(&mut buffer);
//!         let mut entry = Writer::new();
//!         entry.pack_str("hello")?;
//!         stream.write_blob(entry.as_bytes())?;
//!         stream.flush()?;
//!     }
//!
//!     let mut stream = StreamReader::new(Cursor::new(&buffer));
//!     let blob = stream.read_blob()?;
//!     assert_eq!(Reader::new(&blob).unpack_str()?, "hello");
//!     assert!(stream.try_read_blob()?.is_none());
//!     Ok(())
//! }
//! ```

use std::io::{self, BufReader, BufWriter, Read, Write};

use byteorder::{BigEndian, ByteOrder};
use tracing::trace;

use crate::error::{Error, Result};
use crate::flurry::{Tag, Width, Writer, DEFAULT_MAX_LENGTH};

/// Default buffer capacity for stream readers/writers.
const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// StreamWriter appends flurry blobs to a byte stream.
pub struct StreamWriter<W: Write> {
    inner: BufWriter<W>,
    header: Writer,
}

impl<W: Write> StreamWriter<W> {
    /// Creates a new StreamWriter wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, writer)
    }

    /// Creates a new StreamWriter with the specified buffer capacity.
    pub fn with_capacity(capacity: usize, writer: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, writer),
            header: Writer::with_capacity(8),
        }
    }

    /// Writes one blob.
    pub fn write_blob(&mut self, data: &[u8]) -> Result<()> {
        self.header.reset();
        self.header.pack_blob_header(data.len())?;
        self.inner.write_all(self.header.as_bytes())?;
        self.inner.write_all(data)?;
        trace!(len = data.len(), "wrote blob");
        Ok(())
    }

    /// Flushes the underlying buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::from)
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Consumes this StreamWriter, returning the underlying writer.
    ///
    /// This will flush any buffered data before returning the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| Error::from(e.into_error()))
    }
}

/// StreamReader reads flurry blobs from a byte stream.
pub struct StreamReader<R: Read> {
    inner: BufReader<R>,
    max_blob_size: usize,
}

impl<R: Read> StreamReader<R> {
    /// Creates a new StreamReader wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, reader)
    }

    /// Creates a new StreamReader with the specified buffer capacity.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, reader),
            max_blob_size: DEFAULT_MAX_LENGTH,
        }
    }

    /// Sets the maximum allowed blob size.
    pub fn set_max_blob_size(&mut self, size: usize) {
        self.max_blob_size = size;
    }

    /// Reads one blob; end of stream is an error.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        self.try_read_blob()?.ok_or_else(|| Error::sudden_eof(1, 0))
    }

    /// Attempts to read a blob, returning None if the stream ends cleanly
    /// before the tag byte.
    pub fn try_read_blob(&mut self) -> Result<Option<Vec<u8>>> {
        let mut tag = [0u8; 1];
        loop {
            match self.inner.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e)),
            }
        }

        let width = match Tag::classify(tag[0])? {
            Tag::Bin(width) => width,
            _ => return Err(Error::unexpected(tag[0], "blob")),
        };

        let mut prefix = [0u8; 4];
        let prefix = &mut prefix[..width.bytes()];
        self.read_exact(prefix)?;
        let length = match width {
            Width::One => prefix[0] as usize,
            Width::Two => BigEndian::read_u16(prefix) as usize,
            _ => BigEndian::read_u32(prefix) as usize,
        };

        if length > self.max_blob_size {
            return Err(Error::LengthExceeded {
                found: length,
                max: self.max_blob_size,
            });
        }

        let mut data = vec![0u8; length];
        self.read_exact(&mut data)?;
        trace!(len = length, "read blob");
        Ok(Some(data))
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::sudden_eof(buf.len(), filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e)),
            }
        }
        Ok(())
    }
}

/// Iterator over blobs in a stream.
pub struct BlobIter<'a, R: Read> {
    reader: &'a mut StreamReader<R>,
}

impl<R: Read> StreamReader<R> {
    /// Returns an iterator over blobs in the stream.
    pub fn blobs(&mut self) -> BlobIter<'_, R> {
        BlobIter { reader: self }
    }
}

impl<R: Read> Iterator for BlobIter<'_, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.try_read_blob().transpose()
    }
}
