//! Wire types and field definitions.

use std::fmt;

use crate::{FieldIndex, TypeId};

/// Primitive wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PrimitiveType {
    /// Length-prefixed UTF-8 string.
    String,
    /// Prefix-tagged variable encoding, decoded as `f64`.
    Number,
    /// Single byte, non-zero is `true`.
    Boolean,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
}

impl PrimitiveType {
    /// All primitive types, in wire-tag order.
    pub const ALL: [Self; 13] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Int64,
        Self::Uint64,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the protocol name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Parses a protocol type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Returns `true` for the signed fixed-width integer types.
    #[must_use]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` for the unsigned fixed-width integer types.
    #[must_use]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }

    /// Returns `true` for `number`, `float32` and `float64`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Number | Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The container kind of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum CollectionKind {
    /// Ordered list; the dynamic index is the integer position.
    Array,
    /// Keyed map; the dynamic index is a string key.
    Map,
}

impl CollectionKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Map => "map",
        }
    }
}

/// Element type of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ElementType {
    /// Primitive elements stored inline.
    Primitive(PrimitiveType),
    /// Schema elements stored by reference.
    Schema(TypeId),
}

impl ElementType {
    /// Returns the schema type id for schema elements.
    #[must_use]
    pub const fn schema_type(self) -> Option<TypeId> {
        match self {
            Self::Schema(id) => Some(id),
            Self::Primitive(_) => None,
        }
    }

    /// Returns the primitive type for primitive elements.
    #[must_use]
    pub const fn primitive_type(self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(ty) => Some(ty),
            Self::Schema(_) => None,
        }
    }
}

/// The declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FieldType {
    /// Inline primitive value.
    Primitive(PrimitiveType),
    /// Reference to a child schema object.
    Ref(TypeId),
    /// Reference to a collection.
    Collection {
        kind: CollectionKind,
        element: ElementType,
    },
}

impl FieldType {
    #[must_use]
    pub const fn primitive(ty: PrimitiveType) -> Self {
        Self::Primitive(ty)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::Primitive(PrimitiveType::String)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::Primitive(PrimitiveType::Number)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::Primitive(PrimitiveType::Boolean)
    }

    #[must_use]
    pub const fn reference(ty: TypeId) -> Self {
        Self::Ref(ty)
    }

    #[must_use]
    pub const fn array_of(element: ElementType) -> Self {
        Self::Collection {
            kind: CollectionKind::Array,
            element,
        }
    }

    #[must_use]
    pub const fn map_of(element: ElementType) -> Self {
        Self::Collection {
            kind: CollectionKind::Map,
            element,
        }
    }

    /// Returns the wire type tag of the field.
    #[must_use]
    pub const fn wire_type(self) -> WireType {
        match self {
            Self::Primitive(ty) => WireType::Primitive(ty),
            Self::Ref(_) => WireType::Ref,
            Self::Collection {
                kind: CollectionKind::Array,
                ..
            } => WireType::Array,
            Self::Collection {
                kind: CollectionKind::Map,
                ..
            } => WireType::Map,
        }
    }

    /// Returns the nested type for reference and collection fields.
    #[must_use]
    pub const fn nested_type(self) -> Option<ElementType> {
        match self {
            Self::Primitive(_) => None,
            Self::Ref(id) => Some(ElementType::Schema(id)),
            Self::Collection { element, .. } => Some(element),
        }
    }

    /// Returns `true` if values of this field are tracked by reference id.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        !matches!(self, Self::Primitive(_))
    }
}

/// Wire type tag as seen by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Primitive(PrimitiveType),
    Ref,
    Array,
    Map,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(ty) => f.write_str(ty.name()),
            Self::Ref => f.write_str("ref"),
            Self::Array => f.write_str("array"),
            Self::Map => f.write_str("map"),
        }
    }
}

/// Field definition within a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDef {
    pub index: FieldIndex,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: FieldType,
}

impl FieldDef {
    /// Creates a field definition.
    #[must_use]
    pub fn new(index: FieldIndex, name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            index,
            name: name.into(),
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_roundtrip() {
        for ty in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(PrimitiveType::from_name("ref"), None);
    }

    #[test]
    fn primitive_classification() {
        assert!(PrimitiveType::Int16.is_signed_int());
        assert!(PrimitiveType::Uint64.is_unsigned_int());
        assert!(PrimitiveType::Number.is_float());
        assert!(!PrimitiveType::String.is_float());
    }

    #[test]
    fn wire_and_nested_types() {
        let player = FieldType::reference(3);
        assert_eq!(player.wire_type(), WireType::Ref);
        assert_eq!(player.nested_type(), Some(ElementType::Schema(3)));

        let scores = FieldType::map_of(ElementType::Primitive(PrimitiveType::Int32));
        assert_eq!(scores.wire_type(), WireType::Map);
        assert_eq!(
            scores.nested_type().and_then(ElementType::primitive_type),
            Some(PrimitiveType::Int32)
        );

        let name = FieldType::string();
        assert_eq!(name.wire_type(), WireType::Primitive(PrimitiveType::String));
        assert_eq!(name.nested_type(), None);
        assert!(!name.is_reference());
    }

    #[test]
    fn wire_type_display() {
        assert_eq!(WireType::Ref.to_string(), "ref");
        assert_eq!(WireType::Array.to_string(), "array");
        assert_eq!(
            WireType::Primitive(PrimitiveType::Float32).to_string(),
            "float32"
        );
    }

    #[test]
    fn field_def_construction() {
        let field = FieldDef::new(2, "x", FieldType::number());
        assert_eq!(field.index, 2);
        assert_eq!(field.name, "x");
    }
}
