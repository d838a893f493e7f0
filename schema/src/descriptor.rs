//! Schema descriptors and validation.

use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};
use crate::{ElementType, FieldDef, FieldIndex, FieldType, WireType, MAX_FIELD_INDEX};

/// Static field layout of one concrete schema type.
///
/// Built once through [`SchemaDescriptorBuilder`] and immutable afterwards.
/// Fields are kept in ascending wire-index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<FieldDef>,
    by_index: HashMap<FieldIndex, usize>,
    by_name: HashMap<String, usize>,
}

impl SchemaDescriptor {
    /// Creates a descriptor builder for a type name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaDescriptorBuilder {
        SchemaDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a descriptor from field definitions after validation.
    pub fn new(name: impl Into<String>, mut fields: Vec<FieldDef>) -> SchemaResult<Self> {
        let name = name.into();
        fields.sort_by_key(|field| field.index);

        let mut by_index = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if field.index > MAX_FIELD_INDEX {
                return Err(SchemaError::FieldIndexOutOfRange {
                    type_name: name,
                    index: field.index,
                });
            }
            if by_index.insert(field.index, pos).is_some() {
                return Err(SchemaError::DuplicateFieldIndex {
                    type_name: name,
                    index: field.index,
                });
            }
            if by_name.insert(field.name.clone(), pos).is_some() {
                return Err(SchemaError::DuplicateFieldName {
                    type_name: name,
                    name: field.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            fields,
            by_index,
            by_name,
        })
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all fields in wire-index order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the type declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field at a wire index.
    #[must_use]
    pub fn field_by_index(&self, index: FieldIndex) -> Option<&FieldDef> {
        self.by_index.get(&index).map(|&pos| &self.fields[pos])
    }

    /// Returns the field with the given name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).map(|&pos| &self.fields[pos])
    }

    /// Returns the storage slot of a field name (its position in [`fields`](Self::fields)).
    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the storage slot of a wire index.
    #[must_use]
    pub fn slot_of_index(&self, index: FieldIndex) -> Option<usize> {
        self.by_index.get(&index).copied()
    }

    /// Returns the field name declared at a wire index.
    #[must_use]
    pub fn field_name_for_index(&self, index: FieldIndex) -> Option<&str> {
        self.field_by_index(index).map(|field| field.name.as_str())
    }

    /// Returns the wire type of a named field.
    #[must_use]
    pub fn wire_type_of(&self, name: &str) -> Option<WireType> {
        self.field_by_name(name).map(|field| field.ty.wire_type())
    }

    /// Returns the nested element type of a named reference or collection field.
    #[must_use]
    pub fn nested_type_of(&self, name: &str) -> Option<ElementType> {
        self.field_by_name(name).and_then(|field| field.ty.nested_type())
    }

    /// Iterates over fields whose values are tracked by reference id.
    pub fn reference_fields(&self) -> impl Iterator<Item = (usize, &FieldDef)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.ty.is_reference())
    }
}

/// Builder for `SchemaDescriptor`.
#[derive(Debug, Default)]
pub struct SchemaDescriptorBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl SchemaDescriptorBuilder {
    /// Adds a field definition.
    #[must_use]
    pub fn field(mut self, index: FieldIndex, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDef::new(index, name, ty));
        self
    }

    /// Builds the descriptor after validation.
    pub fn build(self) -> SchemaResult<SchemaDescriptor> {
        SchemaDescriptor::new(self.name, self.fields)
    }
}
