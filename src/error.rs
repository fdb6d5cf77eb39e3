//! Error types for arsenal codec operations.

use thiserror::Error;

/// Result type for arsenal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unexpected input.
    Decode,
    /// Internal invariant violated while producing output.
    Encode,
    /// Value has no wire representation or is too large for one.
    UnsupportedType,
    /// Underlying file or stream failure.
    Io,
}

/// Error type for arsenal operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input ended while a tag or payload was expected.
    #[error("sudden end of input: needed {needed} bytes, only {available} available")]
    SuddenEof { needed: usize, available: usize },

    /// Tag byte that is not part of the tag space.
    #[error("invalid tag: {0:#04x}")]
    InvalidTag(u8),

    /// Valid tag of the wrong logical type.
    #[error("unexpected tag {tag:#04x}, expected {expected}")]
    UnexpectedTag { tag: u8, expected: &'static str },

    /// Decoded integer does not fit the destination type.
    #[error("integer {value} does not fit into {target}")]
    IntegerOverflow { value: i128, target: &'static str },

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Boolean byte other than 0 or 1.
    #[error("invalid bool byte: {0:#04x}")]
    InvalidBool(u8),

    /// Array header does not match a fixed-size destination.
    #[error("array length mismatch: expected {expected}, found {found}")]
    ArrayLength { expected: usize, found: usize },

    /// Constant marker field did not match.
    #[error("marker mismatch: expected {expected:#x}, found {found:#x}")]
    MarkerMismatch { expected: u64, found: u64 },

    /// Variant selector does not index a declared candidate.
    #[error("variant selector {selector} out of range ({candidates} candidates)")]
    InvalidSelector { selector: u64, candidates: usize },

    /// Enum field holds a value that names none of its variants.
    #[error("invalid discriminant {value:#x} for {name}")]
    InvalidDiscriminant { name: &'static str, value: u64 },

    /// Conditional field references a field that is not an earlier flag field.
    #[error("no flag field at index {0}")]
    MissingFlag(usize),

    /// Flag bits disagree with the populated conditional fields.
    #[error("flag field {index} disagrees with field contents: {reason}")]
    FlagMismatch { index: usize, reason: &'static str },

    /// Buffer overflow during encoding.
    #[error("buffer overflow: needed {needed} bytes, only {available} available")]
    BufferOverflow { needed: usize, available: usize },

    /// Buffer underflow during decoding.
    #[error("buffer underflow: needed {needed} bytes, only {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    /// Declared length exceeds the configured limit.
    #[error("length exceeded: {found} > {max}")]
    LengthExceeded { found: usize, max: usize },

    /// Nesting exceeds the configured limit.
    #[error("nesting depth exceeded: {0}")]
    DepthExceeded(usize),

    /// Length does not fit the widest length prefix.
    #[error("unsupported size: {size} > {max}")]
    UnsupportedSize { size: usize, max: usize },

    /// Value has no wire representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Internal encoder invariant violated.
    #[error("encoding error: {0}")]
    Encode(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a sudden EOF error.
    pub fn sudden_eof(needed: usize, available: usize) -> Self {
        Self::SuddenEof { needed, available }
    }

    /// Creates a buffer overflow error.
    pub fn buffer_overflow(needed: usize, available: usize) -> Self {
        Self::BufferOverflow { needed, available }
    }

    /// Creates a buffer underflow error.
    pub fn buffer_underflow(needed: usize, available: usize) -> Self {
        Self::BufferUnderflow { needed, available }
    }

    /// Creates an unexpected tag error.
    pub fn unexpected(tag: u8, expected: &'static str) -> Self {
        Self::UnexpectedTag { tag, expected }
    }

    /// Returns the broad kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SuddenEof { .. }
            | Error::InvalidTag(_)
            | Error::UnexpectedTag { .. }
            | Error::IntegerOverflow { .. }
            | Error::InvalidUtf8
            | Error::InvalidBool(_)
            | Error::ArrayLength { .. }
            | Error::MarkerMismatch { .. }
            | Error::InvalidSelector { .. }
            | Error::InvalidDiscriminant { .. }
            | Error::MissingFlag(_)
            | Error::BufferUnderflow { .. }
            | Error::LengthExceeded { .. }
            | Error::DepthExceeded(_) => ErrorKind::Decode,
            Error::FlagMismatch { .. } | Error::BufferOverflow { .. } | Error::Encode(_) => {
                ErrorKind::Encode
            }
            Error::UnsupportedSize { .. } | Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns true if the input ended before a value was complete.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::SuddenEof { .. } | Error::BufferUnderflow { .. })
    }
}
