//! Error types for packing, unpacking and encoding.

use std::fmt;

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Which fixed budget an encode request ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Samples,
    Words,
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Samples => write!(f, "sample"),
            Capacity::Words => write!(f, "packed word"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// Input or output does not fit the configured buffers.
    #[error("{kind} capacity exceeded: need {required}, capacity is {capacity}")]
    CapacityExceeded {
        kind: Capacity,
        required: usize,
        capacity: usize,
    },

    /// A window width cannot be expressed by the 3-bit selector.
    #[error("width {width} cannot be encoded, selector range is [2, 9]")]
    WidthOverflow { width: u32 },

    /// A packer or unpacker was asked for a width outside 1..=16.
    #[error("invalid bit width {width}, must be in 1..=16")]
    InvalidWidth { width: u32 },

    /// Nothing to encode.
    #[error("sample sequence is empty")]
    EmptyInput,

    /// The packed stream ended before all samples were read back.
    #[error("unexpected end of stream at bit {bit_cursor}")]
    UnexpectedEnd { bit_cursor: usize },

    /// The packed stream decoded to something no encoder could have produced.
    #[error("corrupt stream at sample {index}: {reason}")]
    CorruptStream { index: usize, reason: &'static str },

    #[error("invalid wav: {0}")]
    InvalidWav(&'static str),

    #[error("unsupported wav format: {0}")]
    UnsupportedFormat(String),

    /// Array names end up in C source so they have to be identifiers.
    #[error("`{0}` is not a valid C identifier")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

mod tests {
    #[allow(unused_imports)]
    use super::{Capacity, CodecError};

    #[test]
    fn display_carries_details() {
        let err = CodecError::CapacityExceeded {
            kind: Capacity::Samples,
            required: 50_001,
            capacity: 50_000,
        };
        let text = err.to_string();
        assert!(text.contains("sample"));
        assert!(text.contains("50001"));
        assert!(text.contains("50000"));

        let err = CodecError::WidthOverflow { width: 10 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CodecError = io.into();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
