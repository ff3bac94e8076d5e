use crate::buffer::ChainId;
use crate::jvm::code::{JumpWidth, Label};
use crate::jvm::Constant;
use std::fmt;

/// Errors raised while assembling a class
///
/// Every variant indicates a bug on the assembling side (not a transient condition), so none of
/// them are worth retrying. See [`Error::kind`] for the coarse classification.
#[derive(Debug)]
pub enum Error {
    /// Write, link, or read on a chain which has already been spliced into another chain
    ChainLinked,

    /// Chunk storage shared with other chains is in use (eg. by a live chunk iterator)
    ChainBusy,

    /// Blob was reserved from some other chain (or from before the chain was cleared)
    ForeignBlob { blob_chain: ChainId, chain: ChainId },

    /// Extraction window does not fit inside the chain
    OutOfRange {
        start: usize,
        count: usize,
        len: usize,
    },

    /// Value written through a blob does not have the width of the blob
    BlobWidthMismatch { expected: usize, found: usize },

    /// Alignment must be non-zero
    InvalidAlignment(usize),

    /// Label was already placed in the stream
    LabelAlreadyMarked(Label),

    /// Label was not defined by this stream
    UndefinedLabel(Label),

    /// Label is referenced in the stream but was never marked
    UnmarkedLabel(Label),

    /// Relative offset does not fit in the operand width of the jump
    BranchOffsetOutOfRange {
        label: Label,
        offset: i64,
        width: JumpWidth,
    },

    /// `lookupswitch` keys must be added in non-decreasing order
    LookupSwitchKeyOrder { previous: i32, key: i32 },

    /// Stack map frame which has no binary representation
    InvalidStackMapFrame(&'static str),

    ConstantPoolOverflow {
        constant: Constant,
        offset: u32,
    },

    /// Some count or length field cannot represent the size of its table
    TableOverflow { table: &'static str, size: usize },

    MethodCodeOverflow(usize),

    IoError(std::io::Error),
}

/// Coarse classification of [`Error`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation on a chain (or blob) which is not in a state to accept it
    InvalidState,

    /// Window or width outside of what is valid
    Range,

    /// Misuse of labels or builders
    Logic,

    /// Format limit exceeded
    SizeExceeded,

    /// Final output could not be written
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ChainLinked | Error::ChainBusy | Error::ForeignBlob { .. } => {
                ErrorKind::InvalidState
            }

            Error::OutOfRange { .. }
            | Error::BlobWidthMismatch { .. }
            | Error::InvalidAlignment(_) => ErrorKind::Range,

            Error::LabelAlreadyMarked(_)
            | Error::UndefinedLabel(_)
            | Error::UnmarkedLabel(_)
            | Error::BranchOffsetOutOfRange { .. }
            | Error::LookupSwitchKeyOrder { .. }
            | Error::InvalidStackMapFrame(_) => ErrorKind::Logic,

            Error::ConstantPoolOverflow { .. }
            | Error::TableOverflow { .. }
            | Error::MethodCodeOverflow(_) => ErrorKind::SizeExceeded,

            Error::IoError(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChainLinked => write!(f, "buffer chain was already linked into another chain"),
            Error::ChainBusy => write!(f, "chunk storage of the buffer chain is borrowed"),
            Error::ForeignBlob { blob_chain, chain } => write!(
                f,
                "blob belongs to chain {:?} but was used on chain {:?}",
                blob_chain, chain
            ),
            Error::OutOfRange { start, count, len } => write!(
                f,
                "window of {} bytes at {} is outside of {} bytes of content",
                count, start, len
            ),
            Error::BlobWidthMismatch { expected, found } => write!(
                f,
                "blob is {} bytes wide but value is {} bytes wide",
                expected, found
            ),
            Error::InvalidAlignment(alignment) => write!(f, "cannot align to {}", alignment),
            Error::LabelAlreadyMarked(label) => write!(f, "label {:?} is already marked", label),
            Error::UndefinedLabel(label) => write!(f, "label {:?} is not defined", label),
            Error::UnmarkedLabel(label) => {
                write!(f, "label {:?} is referenced but never marked", label)
            }
            Error::BranchOffsetOutOfRange {
                label,
                offset,
                width,
            } => write!(
                f,
                "offset {} to label {:?} does not fit in a {:?} jump",
                offset, label, width
            ),
            Error::LookupSwitchKeyOrder { previous, key } => write!(
                f,
                "lookupswitch key {} added after larger key {}",
                key, previous
            ),
            Error::InvalidStackMapFrame(reason) => write!(f, "invalid stack map frame: {}", reason),
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool overflow at slot {} inserting {:?}",
                offset, constant
            ),
            Error::TableOverflow { table, size } => {
                write!(f, "{} has size {} which overflows its length field", table, size)
            }
            Error::MethodCodeOverflow(len) => {
                write!(f, "method code is {} bytes long (max is 65535)", len)
            }
            Error::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
