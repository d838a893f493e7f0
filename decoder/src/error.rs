//! Error types for patch decoding.

use std::fmt;

use bytestream::ByteError;
use schema::{SchemaError, TypeId};

use crate::types::{RefId, RefKind};

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a patch or wiring listeners.
///
/// Every variant except [`DecodeError::ListenersFailed`] aborts the decode
/// call. Mutations applied before the failing byte stay applied; change
/// dispatch and the reachability sweep do not run.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Byte-level read error.
    Bytes(ByteError),

    /// Schema or registry error.
    Schema(SchemaError),

    /// A reference id was addressed before it was introduced.
    RefNotFound { ref_id: RefId, offset: usize },

    /// A type discriminator is not registered.
    UnknownType { type_id: TypeId, offset: usize },

    /// A reference id is not a non-negative integer.
    InvalidRefId { offset: usize },

    /// A collection wire index is not a non-negative integer.
    InvalidWireIndex { offset: usize },

    /// A collection operation addressed a wire index with no dynamic index.
    IndexNotFound { ref_id: RefId, wire_index: u32 },

    /// Operation byte is not valid for a collection target.
    InvalidOperation { ref_id: RefId, op: u8, offset: usize },

    /// A reference id is tracked with a different kind than expected.
    KindMismatch { ref_id: RefId, expected: RefKind },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// One or more listeners panicked during dispatch.
    ListenersFailed { failures: usize },
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    PatchBytes,
    TrackedRefs,
    StringBytes,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(e) => write!(f, "byte error: {e}"),
            Self::Schema(e) => write!(f, "schema error: {e}"),
            Self::RefNotFound { ref_id, offset } => {
                write!(f, "ref {ref_id} not found at offset {offset}")
            }
            Self::UnknownType { type_id, offset } => {
                write!(f, "unknown type id {type_id} at offset {offset}")
            }
            Self::InvalidRefId { offset } => write!(f, "invalid ref id at offset {offset}"),
            Self::InvalidWireIndex { offset } => {
                write!(f, "invalid wire index at offset {offset}")
            }
            Self::IndexNotFound { ref_id, wire_index } => {
                write!(f, "no dynamic index for wire index {wire_index} in {ref_id}")
            }
            Self::InvalidOperation { ref_id, op, offset } => {
                write!(
                    f,
                    "invalid operation 0x{op:02X} for collection {ref_id} at offset {offset}"
                )
            }
            Self::KindMismatch { ref_id, expected } => {
                write!(f, "ref {ref_id} is not a {expected}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::ListenersFailed { failures } => {
                write!(f, "{failures} listener(s) panicked during dispatch")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PatchBytes => "patch bytes",
            Self::TrackedRefs => "tracked refs",
            Self::StringBytes => "string bytes",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bytes(e) => Some(e),
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ByteError> for DecodeError {
    fn from(err: ByteError) -> Self {
        Self::Bytes(err)
    }
}

impl From<SchemaError> for DecodeError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}
