use std::fmt;

/// Ways in which a class file can fail to be well formed
///
/// Offsets are byte offsets from the start of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Input ended while `needed` more bytes were expected at `offset`
    Truncated { offset: usize, needed: usize },

    /// First four bytes are not `0xCAFEBABE`
    BadMagic(u32),

    BadConstantTag { offset: usize, tag: u8 },

    /// Constant pool index is zero, out of bounds, or the second slot of a `Long`/`Double`
    BadConstantIndex(u16),

    /// Constant pool entry is not of the kind expected where it is referenced
    UnexpectedConstant { index: u16, expected: &'static str },

    BadModifiedUtf8 { offset: usize },

    BadOpcode { offset: usize, opcode: u8 },

    /// Attribute body does not match the layout its name calls for
    BadAttribute { name: String, reason: &'static str },

    /// Extra bytes after the end of the class
    TrailingBytes { offset: usize },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadError::Truncated { offset, needed } => {
                write!(f, "unexpected end of input at {} (needed {} more bytes)", offset, needed)
            }
            ReadError::BadMagic(magic) => write!(f, "bad magic number {:#010x}", magic),
            ReadError::BadConstantTag { offset, tag } => {
                write!(f, "unknown constant tag {} at {}", tag, offset)
            }
            ReadError::BadConstantIndex(index) => write!(f, "bad constant pool index {}", index),
            ReadError::UnexpectedConstant { index, expected } => {
                write!(f, "constant {} should be a {} constant", index, expected)
            }
            ReadError::BadModifiedUtf8 { offset } => {
                write!(f, "malformed modified UTF-8 at {}", offset)
            }
            ReadError::BadOpcode { offset, opcode } => {
                write!(f, "unknown opcode {:#04x} at {}", opcode, offset)
            }
            ReadError::BadAttribute { name, reason } => {
                write!(f, "malformed {} attribute: {}", name, reason)
            }
            ReadError::TrailingBytes { offset } => {
                write!(f, "trailing bytes after the end of the class at {}", offset)
            }
        }
    }
}

impl std::error::Error for ReadError {}
