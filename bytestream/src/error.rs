//! Error types for byte-level decoding.

use std::fmt;

/// Result type for bytestream operations.
pub type ByteResult<T> = Result<T, ByteError>;

/// Errors that can occur while reading patch bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof {
        /// Offset at which the read started.
        offset: usize,
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// The prefix byte of a `number` is not a known encoding.
    InvalidNumberPrefix {
        /// Offset of the prefix byte.
        offset: usize,
        /// The prefix byte.
        prefix: u8,
    },

    /// The prefix byte of a `string` is not a known encoding.
    InvalidStringPrefix {
        /// Offset of the prefix byte.
        offset: usize,
        /// The prefix byte.
        prefix: u8,
    },

    /// String payload is not valid UTF-8.
    InvalidUtf8 {
        /// Offset of the string payload.
        offset: usize,
    },
}

impl fmt::Display for ByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                offset,
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes at offset {offset} but only {available} bytes available"
                )
            }
            Self::InvalidNumberPrefix { offset, prefix } => {
                write!(f, "invalid number prefix 0x{prefix:02x} at offset {offset}")
            }
            Self::InvalidStringPrefix { offset, prefix } => {
                write!(f, "invalid string prefix 0x{prefix:02x} at offset {offset}")
            }
            Self::InvalidUtf8 { offset } => {
                write!(f, "string at offset {offset} is not valid utf-8")
            }
        }
    }
}

impl std::error::Error for ByteError {}
