//! Schema validation errors.

use std::fmt;

use crate::{FieldIndex, TypeId};

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building descriptors or resolving types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Duplicate type discriminator in a registry.
    DuplicateTypeId { id: TypeId },

    /// Duplicate wire index within a descriptor.
    DuplicateFieldIndex { type_name: String, index: FieldIndex },

    /// Duplicate field name within a descriptor.
    DuplicateFieldName { type_name: String, name: String },

    /// Wire index beyond the addressable range.
    FieldIndexOutOfRange { type_name: String, index: FieldIndex },

    /// A reference or collection field names a type that is not registered.
    UnknownNestedType {
        type_name: String,
        field: String,
        id: TypeId,
    },

    /// Discriminator not present in the registry.
    UnknownTypeId { id: TypeId },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTypeId { id } => write!(f, "type id {id} registered twice"),
            Self::DuplicateFieldIndex { type_name, index } => {
                write!(f, "{type_name}: duplicate field index {index}")
            }
            Self::DuplicateFieldName { type_name, name } => {
                write!(f, "{type_name}: duplicate field name {name:?}")
            }
            Self::FieldIndexOutOfRange { type_name, index } => {
                write!(
                    f,
                    "{type_name}: field index {index} exceeds max {}",
                    crate::MAX_FIELD_INDEX
                )
            }
            Self::UnknownNestedType {
                type_name,
                field,
                id,
            } => {
                write!(f, "{type_name}.{field}: unknown nested type id {id}")
            }
            Self::UnknownTypeId { id } => write!(f, "unknown type id {id}"),
        }
    }
}

impl std::error::Error for SchemaError {}
