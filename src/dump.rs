//! Timestamped binary diagnostic dumps.
//!
//! A dump file is a stream of flurry blobs. Each blob holds one entry: the
//! comment string, the UTC timestamp string and the dumped bytes as a blob.
//! The `log_dump` binary prints such files.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::flurry::{Reader, Writer};
use crate::stream::{StreamReader, StreamWriter};

/// File written by [`file_dump`].
pub const DEFAULT_DUMP_FILE: &str = "dump.bin";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

// Serializes appends from all threads of the process.
static DUMP_LOCK: Mutex<()> = Mutex::new(());

/// One decoded dump entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    pub comment: String,
    pub timestamp: String,
    pub data: Bytes,
}

impl DumpEntry {
    /// Encodes the entry as the payload of one dump blob.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::with_capacity(self.data.len() + self.comment.len() + 40);
        writer.pack_str(&self.comment)?;
        writer.pack_str(&self.timestamp)?;
        writer.pack_blob(&self.data)?;
        Ok(writer.into_bytes())
    }

    /// Decodes the payload of one dump blob.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(payload);
        Ok(Self {
            comment: reader.unpack_string()?,
            timestamp: reader.unpack_string()?,
            data: reader.unpack_bytes()?,
        })
    }
}

/// Appends `data` to [`DEFAULT_DUMP_FILE`] in the working directory.
pub fn file_dump(data: &[u8], comment: &str) -> Result<()> {
    file_dump_to(DEFAULT_DUMP_FILE, data, comment)
}

/// Appends `data` with `comment` and the current time to the dump file at `path`.
pub fn file_dump_to(path: impl AsRef<Path>, data: &[u8], comment: &str) -> Result<()> {
    let path = path.as_ref();
    let _guard = DUMP_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let entry = DumpEntry {
        comment: comment.to_owned(),
        timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        data: Bytes::copy_from_slice(data),
    };
    let payload = entry.encode()?;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut stream = StreamWriter::new(file);
    stream.write_blob(&payload)?;
    stream.flush()?;

    debug!(path = %path.display(), len = data.len(), comment, "dumped blob");
    Ok(())
}

/// Reads dump entries back, one per blob.
pub struct DumpReader<R: Read> {
    stream: StreamReader<R>,
}

impl DumpReader<File> {
    /// Opens a dump file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: StreamReader::new(reader),
        }
    }

    /// Reads the next entry; `Ok(None)` at a clean end of input.
    pub fn next_entry(&mut self) -> Result<Option<DumpEntry>> {
        match self.stream.try_read_blob()? {
            Some(payload) => DumpEntry::decode(&payload).map(Some),
            None => Ok(None),
        }
    }
}

impl<R: Read> Iterator for DumpReader<R> {
    type Item = Result<DumpEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("arsenal-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_entry_layout() {
        let entry = DumpEntry {
            comment: "hi".into(),
            timestamp: "t".into(),
            data: Bytes::from_static(&[0xaa]),
        };
        assert_eq!(
            entry.encode().unwrap(),
            [0xa2, b'h', b'i', 0xa1, b't', 0xc4, 1, 0xaa]
        );
        assert_eq!(DumpEntry::decode(&entry.encode().unwrap()).unwrap(), entry);
    }

    #[test]
    fn test_file_dump_appends() {
        let path = temp_path("dump.bin");
        let _ = std::fs::remove_file(&path);

        file_dump_to(&path, b"first", "one").unwrap();
        file_dump_to(&path, &[0, 1, 2], "two").unwrap();

        let entries = DumpReader::open(&path)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].comment, "one");
        assert_eq!(entries[0].data, Bytes::from_static(b"first"));
        assert_eq!(entries[1].comment, "two");
        assert_eq!(entries[1].data, Bytes::from_static(&[0, 1, 2]));
        // e.g. 2026-10-16T12:34:56.123456Z
        assert_eq!(entries[0].timestamp.len(), 27);
        assert!(entries[0].timestamp.ends_with('Z'));
    }

    #[test]
    fn test_truncated_entry() {
        let mut buffer = Vec::new();
        {
            let mut stream = StreamWriter::new(&mut buffer);
            let entry = DumpEntry {
                comment: "c".into(),
                timestamp: "t".into(),
                data: Bytes::from_static(b"payload"),
            };
            stream.write_blob(&entry.encode().unwrap()).unwrap();
            stream.flush().unwrap();
        }
        buffer.pop();

        let mut reader = DumpReader::new(Cursor::new(buffer));
        assert!(reader.next_entry().unwrap_err().is_eof());
    }
}
