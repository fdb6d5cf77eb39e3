//! Canonical hex+ASCII dumps of byte slices.
//!
//! ```text
//! 00000000  48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 0a        |Hello, world!.|
//! 0000000e
//! ```

use std::fmt;

/// Bytes per line.
pub const DEFAULT_STRIDE: usize = 16;

/// Extra space after this many bytes of a line.
pub const DEFAULT_SPLIT: usize = 8;

/// A configurable hex dump view of a byte slice.
#[derive(Debug, Clone, Copy)]
pub struct Hexdump<'a> {
    data: &'a [u8],
    stride: usize,
    split: usize,
    indent: usize,
}

impl<'a> Hexdump<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            stride: DEFAULT_STRIDE,
            split: DEFAULT_SPLIT,
            indent: 0,
        }
    }

    /// Sets the number of bytes per line (at least 1).
    pub fn stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Sets the column after which an extra space is printed.
    pub fn split(mut self, split: usize) -> Self {
        self.split = split;
        self
    }

    /// Sets the number of spaces before every line.
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

fn printable(byte: u8) -> char {
    if (32..=126).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

impl fmt::Display for Hexdump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = " ".repeat(self.indent);
        let mut offset = 0;

        for line in self.data.chunks(self.stride) {
            write!(f, "{}{:08x}  ", indent, offset)?;
            for (i, byte) in line.iter().enumerate() {
                write!(f, "{:02x} ", byte)?;
                if i + 1 == self.split {
                    f.write_str(" ")?;
                }
            }
            if line.len() < self.stride {
                if line.len() < self.split {
                    f.write_str(" ")?;
                }
                for _ in line.len()..self.stride {
                    f.write_str("   ")?;
                }
            }
            f.write_str(" |")?;
            for byte in line {
                write!(f, "{}", printable(*byte))?;
            }
            f.write_str("|\n")?;
            offset += line.len();
        }

        writeln!(f, "{}{:08x}", indent, offset)
    }
}

/// Formats `data` with the default layout.
pub fn hexdump(data: &[u8]) -> String {
    Hexdump::new(data).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(hexdump(&[]), "00000000\n");
    }

    #[test]
    fn test_full_line() {
        let data: Vec<u8> = (0x41..0x51).collect();
        assert_eq!(
            hexdump(&data),
            "00000000  41 42 43 44 45 46 47 48  49 4a 4b 4c 4d 4e 4f 50  |ABCDEFGHIJKLMNOP|\n\
             00000010\n"
        );
    }

    #[test]
    fn test_partial_line_is_padded() {
        let out = hexdump(b"Hello, world!\n");
        assert_eq!(
            out,
            "00000000  48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 0a        |Hello, world!.|\n\
             0000000e\n"
        );
        let short = hexdump(&[0x00, 0x7f]);
        let first = short.lines().next().unwrap();
        assert_eq!(first.len(), 64);
        assert!(first.ends_with("|..|"));
    }

    #[test]
    fn test_indent_and_stride() {
        let out = Hexdump::new(&[1, 2, 3]).stride(2).split(1).indent(2).to_string();
        assert_eq!(
            out,
            "  00000000  01  02  |..|\n  00000002  03      |.|\n  00000003\n"
        );
    }
}
