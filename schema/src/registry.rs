//! Type registry: numeric discriminator to schema descriptor.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::{ElementType, FieldDef, SchemaDescriptor, TypeId};

/// Maps type discriminators to schema descriptors.
///
/// Nested reference and collection fields name their element type by
/// discriminator, so recursive types are expressed without cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RegistryDef", into = "RegistryDef")
)]
pub struct TypeRegistry {
    types: BTreeMap<TypeId, Arc<SchemaDescriptor>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under a discriminator.
    pub fn register(&mut self, id: TypeId, descriptor: SchemaDescriptor) -> SchemaResult<()> {
        if self.types.contains_key(&id) {
            return Err(SchemaError::DuplicateTypeId { id });
        }
        self.types.insert(id, Arc::new(descriptor));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, id: TypeId, descriptor: SchemaDescriptor) -> SchemaResult<Self> {
        self.register(id, descriptor)?;
        Ok(self)
    }

    /// Resolves a discriminator.
    pub fn resolve(&self, id: TypeId) -> SchemaResult<Arc<SchemaDescriptor>> {
        self.types
            .get(&id)
            .cloned()
            .ok_or(SchemaError::UnknownTypeId { id })
    }

    /// Returns the descriptor for a discriminator, if registered.
    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&SchemaDescriptor> {
        self.types.get(&id).map(AsRef::as_ref)
    }

    /// Returns `true` if the discriminator is registered.
    #[must_use]
    pub fn contains(&self, id: TypeId) -> bool {
        self.types.contains_key(&id)
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over registered types in discriminator order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &SchemaDescriptor)> {
        self.types.iter().map(|(id, desc)| (*id, desc.as_ref()))
    }

    /// Validates that every nested schema type is registered.
    pub fn validate(&self) -> SchemaResult<()> {
        for desc in self.types.values() {
            for field in desc.fields() {
                if let Some(ElementType::Schema(id)) = field.ty.nested_type() {
                    if !self.types.contains_key(&id) {
                        return Err(SchemaError::UnknownNestedType {
                            type_name: desc.name().to_string(),
                            field: field.name.clone(),
                            id,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Serializable registry layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryDef {
    pub types: Vec<TypeDef>,
}

/// Serializable descriptor layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDef {
    pub id: TypeId,
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl TryFrom<RegistryDef> for TypeRegistry {
    type Error = SchemaError;

    fn try_from(def: RegistryDef) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for ty in def.types {
            registry.register(ty.id, SchemaDescriptor::new(ty.name, ty.fields)?)?;
        }
        registry.validate()?;
        Ok(registry)
    }
}

impl From<TypeRegistry> for RegistryDef {
    fn from(registry: TypeRegistry) -> Self {
        Self {
            types: registry
                .iter()
                .map(|(id, desc)| TypeDef {
                    id,
                    name: desc.name().to_string(),
                    fields: desc.fields().to_vec(),
                })
                .collect(),
        }
    }
}
