//! Schema descriptors and type registry for the deltastate decoder.
//!
//! This crate defines the static shape of synchronized state:
//! - Primitive wire types, reference fields and collection fields
//! - Per-type field layout (wire index ↔ field name ↔ wire type ↔ nested type)
//! - A registry mapping numeric type discriminators to descriptors
//! - Deterministic registry hashing
//!
//! # Design Principles
//!
//! - **Declarative descriptors** - Field tables are declared through a builder, not reflected.
//! - **Built once** - Descriptors are immutable after construction and shared by `Arc`.
//! - **Deterministic hashing** - Registry hash is stable given the same definitions.

mod descriptor;
mod error;
mod field;
mod hash;
mod registry;

pub use descriptor::{SchemaDescriptor, SchemaDescriptorBuilder};
pub use error::{SchemaError, SchemaResult};
pub use field::{CollectionKind, ElementType, FieldDef, FieldType, PrimitiveType, WireType};
pub use hash::registry_hash;
pub use registry::{RegistryDef, TypeDef, TypeRegistry};

/// A numeric type discriminator.
pub type TypeId = u32;

/// A wire field index within a schema type.
pub type FieldIndex = u8;

/// Largest wire index a field may declare; `0xFF` is reserved on the wire.
pub const MAX_FIELD_INDEX: FieldIndex = 254;
