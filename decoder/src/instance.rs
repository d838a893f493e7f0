//! Decoded schema objects.

use std::sync::Arc;

use schema::{FieldDef, SchemaDescriptor, TypeId};

use crate::listener::SchemaListeners;
use crate::types::Value;

/// A live instance of a registered schema type.
///
/// Field values are stored by slot (the field's position in the descriptor's
/// wire-index order). Every field starts as [`Value::Null`].
#[derive(Debug)]
pub struct SchemaInstance {
    type_id: TypeId,
    descriptor: Arc<SchemaDescriptor>,
    values: Vec<Value>,
    pub(crate) listeners: SchemaListeners,
}

impl SchemaInstance {
    #[must_use]
    pub fn new(type_id: TypeId, descriptor: Arc<SchemaDescriptor>) -> Self {
        let values = vec![Value::Null; descriptor.len()];
        Self {
            type_id,
            descriptor,
            values,
            listeners: SchemaListeners::default(),
        }
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub(crate) fn descriptor_arc(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.descriptor)
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns a field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.descriptor
            .slot_of(name)
            .and_then(|slot| self.values.get(slot))
    }

    /// Returns a field value by slot.
    #[must_use]
    pub fn value(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    /// Writes a field value by slot, returning the previous value.
    pub fn set(&mut self, slot: usize, value: Value) -> Option<Value> {
        self.values
            .get_mut(slot)
            .map(|current| std::mem::replace(current, value))
    }

    /// Iterates over fields in wire-index order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDef, &Value)> {
        self.descriptor.fields().iter().zip(&self.values)
    }

    /// Moves change and remove listeners from another instance.
    pub fn move_listeners(&mut self, from: &mut Self) {
        self.listeners.absorb(from.take_listeners());
    }

    pub(crate) fn take_listeners(&mut self) -> SchemaListeners {
        std::mem::take(&mut self.listeners)
    }

    pub(crate) fn absorb_listeners(&mut self, listeners: SchemaListeners) {
        self.listeners.absorb(listeners);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
