//! Ordered list and keyed map containers.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use schema::{CollectionKind, ElementType, PrimitiveType};

use crate::listener::CollectionListeners;
use crate::types::{DynamicIndex, Value};

/// Wire index of a collection element.
pub type WireIndex = u32;

#[derive(Debug, Clone, PartialEq)]
enum Items {
    Array(BTreeMap<usize, Value>),
    Map(IndexMap<String, Value>),
}

/// A tracked collection of primitive values or schema references.
///
/// Arrays use the wire index as the dynamic index. Maps learn a string key
/// for a wire index on ADD and reuse it for every later operation on that
/// wire index. Map iteration follows insertion order.
#[derive(Debug)]
pub struct Collection {
    kind: CollectionKind,
    element: ElementType,
    items: Items,
    indexes: HashMap<WireIndex, DynamicIndex>,
    pub(crate) listeners: CollectionListeners,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(kind: CollectionKind, element: ElementType) -> Self {
        let items = match kind {
            CollectionKind::Array => Items::Array(BTreeMap::new()),
            CollectionKind::Map => Items::Map(IndexMap::new()),
        };
        Self {
            kind,
            element,
            items,
            indexes: HashMap::new(),
            listeners: CollectionListeners::default(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[must_use]
    pub const fn element(&self) -> ElementType {
        self.element
    }

    /// Returns `true` if elements are schema references.
    #[must_use]
    pub const fn has_schema_child(&self) -> bool {
        matches!(self.element, ElementType::Schema(_))
    }

    /// Returns the sentinel "empty" value for this collection's element type.
    #[must_use]
    pub const fn default_value(&self) -> Value {
        match self.element {
            ElementType::Schema(_) => Value::Null,
            ElementType::Primitive(primitive) => primitive_default(primitive),
        }
    }

    /// Establishes the dynamic index for a wire index.
    ///
    /// Re-keying a map wire index drops the element held under the old key.
    pub fn set_index(&mut self, wire_index: WireIndex, dynamic_index: DynamicIndex) {
        if let Some(old) = self.indexes.insert(wire_index, dynamic_index.clone()) {
            if old != dynamic_index {
                self.remove_item(&old);
            }
        }
    }

    /// Resolves the dynamic index of a wire index.
    #[must_use]
    pub fn index_for(&self, wire_index: WireIndex) -> Option<&DynamicIndex> {
        self.indexes.get(&wire_index)
    }

    /// Returns the element at a dynamic index.
    #[must_use]
    pub fn get(&self, index: &DynamicIndex) -> Option<&Value> {
        match (&self.items, index) {
            (Items::Array(items), DynamicIndex::Index(pos)) => items.get(pos),
            (Items::Map(items), DynamicIndex::Key(key)) => items.get(key),
            _ => None,
        }
    }

    /// Returns the element at a list position.
    #[must_use]
    pub fn get_at(&self, pos: usize) -> Option<&Value> {
        self.get(&DynamicIndex::Index(pos))
    }

    /// Returns the element under a map key.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match &self.items {
            Items::Map(items) => items.get(key),
            Items::Array(_) => None,
        }
    }

    /// Returns the element addressed by a wire index, or the sentinel
    /// default when the slot is empty.
    #[must_use]
    pub fn get_by_wire_index(&self, wire_index: WireIndex) -> Value {
        self.item_at_wire(wire_index)
            .cloned()
            .unwrap_or_else(|| self.default_value())
    }

    /// Returns `true` if an element is stored at a wire index.
    #[must_use]
    pub fn contains_wire_index(&self, wire_index: WireIndex) -> bool {
        self.item_at_wire(wire_index).is_some()
    }

    /// Stores an element, establishing the dynamic index for the wire index.
    pub fn set_value(&mut self, wire_index: WireIndex, dynamic_index: DynamicIndex, value: Value) {
        self.set_index(wire_index, dynamic_index.clone());
        match (&mut self.items, dynamic_index) {
            (Items::Array(items), DynamicIndex::Index(pos)) => {
                items.insert(pos, value);
            }
            (Items::Map(items), DynamicIndex::Key(key)) => {
                items.insert(key, value);
            }
            _ => {}
        }
    }

    /// Removes the element at a wire index, returning it.
    pub fn delete(&mut self, wire_index: WireIndex) -> Option<Value> {
        let index = self.resolve_wire(wire_index)?;
        self.indexes.remove(&wire_index);
        self.remove_item(&index)
    }

    /// Removes every element, returning them in iteration order.
    pub fn clear(&mut self) -> Vec<(DynamicIndex, Value)> {
        self.indexes.clear();
        match &mut self.items {
            Items::Array(items) => std::mem::take(items)
                .into_iter()
                .map(|(pos, value)| (DynamicIndex::Index(pos), value))
                .collect(),
            Items::Map(items) => std::mem::take(items)
                .into_iter()
                .map(|(key, value)| (DynamicIndex::Key(key), value))
                .collect(),
        }
    }

    /// Creates a fresh empty collection of the same kind and element type.
    ///
    /// Listeners are not copied; see [`move_listeners`](Self::move_listeners).
    #[must_use]
    pub fn clone_empty(&self) -> Self {
        Self::new(self.kind, self.element)
    }

    /// Moves add, change and remove listeners from another collection,
    /// appending them after this collection's own.
    pub fn move_listeners(&mut self, from: &mut Self) {
        self.listeners.absorb(from.take_listeners());
    }

    pub(crate) fn take_listeners(&mut self) -> CollectionListeners {
        std::mem::take(&mut self.listeners)
    }

    pub(crate) fn absorb_listeners(&mut self, listeners: CollectionListeners) {
        self.listeners.absorb(listeners);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Iterates over elements in order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (DynamicIndex, &Value)> + '_> {
        match &self.items {
            Items::Array(items) => Box::new(
                items
                    .iter()
                    .map(|(pos, value)| (DynamicIndex::Index(*pos), value)),
            ),
            Items::Map(items) => Box::new(
                items
                    .iter()
                    .map(|(key, value)| (DynamicIndex::Key(key.clone()), value)),
            ),
        }
    }

    /// Iterates over element values in order.
    pub fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.items {
            Items::Array(items) => Box::new(items.values()),
            Items::Map(items) => Box::new(items.values()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.items {
            Items::Array(items) => items.len(),
            Items::Map(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve_wire(&self, wire_index: WireIndex) -> Option<DynamicIndex> {
        match self.kind {
            CollectionKind::Array => Some(DynamicIndex::Index(wire_index as usize)),
            CollectionKind::Map => self.indexes.get(&wire_index).cloned(),
        }
    }

    fn item_at_wire(&self, wire_index: WireIndex) -> Option<&Value> {
        let index = self.resolve_wire(wire_index)?;
        self.get(&index)
    }

    fn remove_item(&mut self, index: &DynamicIndex) -> Option<Value> {
        match (&mut self.items, index) {
            (Items::Array(items), DynamicIndex::Index(pos)) => items.remove(pos),
            (Items::Map(items), DynamicIndex::Key(key)) => items.shift_remove(key),
            _ => None,
        }
    }
}

const fn primitive_default(primitive: PrimitiveType) -> Value {
    if primitive.is_signed_int() {
        Value::Int(0)
    } else if primitive.is_unsigned_int() {
        Value::UInt(0)
    } else {
        match primitive {
            PrimitiveType::Boolean => Value::Bool(false),
            PrimitiveType::String => Value::Null,
            _ => Value::Float(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefId;

    fn map_of_players() -> Collection {
        Collection::new(CollectionKind::Map, ElementType::Schema(1))
    }

    #[test]
    fn map_assigns_index_on_add_and_reuses_it() {
        let mut map = map_of_players();
        map.set_value(0, DynamicIndex::from("a"), Value::Ref(RefId::new(5)));
        assert_eq!(map.index_for(0), Some(&DynamicIndex::from("a")));
        assert_eq!(map.get_key("a"), Some(&Value::Ref(RefId::new(5))));

        map.set_value(0, map.index_for(0).cloned().unwrap(), Value::Ref(RefId::new(6)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_wire_index(0), Value::Ref(RefId::new(6)));
    }

    #[test]
    fn map_rekey_drops_old_entry() {
        let mut map = map_of_players();
        map.set_value(0, DynamicIndex::from("a"), Value::Ref(RefId::new(5)));
        map.set_value(0, DynamicIndex::from("b"), Value::Ref(RefId::new(6)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_key("a"), None);
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut map = Collection::new(
            CollectionKind::Map,
            ElementType::Primitive(PrimitiveType::String),
        );
        map.set_value(0, DynamicIndex::from("z"), Value::from("1"));
        map.set_value(1, DynamicIndex::from("a"), Value::from("2"));
        let keys: Vec<_> = map.iter().map(|(index, _)| index).collect();
        assert_eq!(keys, [DynamicIndex::from("z"), DynamicIndex::from("a")]);
    }

    #[test]
    fn array_uses_wire_index() {
        let mut list = Collection::new(
            CollectionKind::Array,
            ElementType::Primitive(PrimitiveType::Number),
        );
        list.set_value(2, DynamicIndex::Index(2), Value::Float(1.5));
        assert_eq!(list.get_at(2), Some(&Value::Float(1.5)));
        assert!(list.contains_wire_index(2));
        assert!(!list.contains_wire_index(0));
        assert_eq!(list.get_by_wire_index(0), Value::Float(0.0));
    }

    #[test]
    fn delete_removes_item_and_index() {
        let mut map = map_of_players();
        map.set_value(3, DynamicIndex::from("k"), Value::Ref(RefId::new(9)));
        assert_eq!(map.delete(3), Some(Value::Ref(RefId::new(9))));
        assert!(map.is_empty());
        assert_eq!(map.index_for(3), None);
        assert_eq!(map.delete(3), None);
    }

    #[test]
    fn clear_returns_removed_items() {
        let mut list = Collection::new(
            CollectionKind::Array,
            ElementType::Primitive(PrimitiveType::Int32),
        );
        list.set_value(0, DynamicIndex::Index(0), Value::Int(4));
        list.set_value(1, DynamicIndex::Index(1), Value::Int(8));
        let removed = list.clear();
        assert_eq!(
            removed,
            [
                (DynamicIndex::Index(0), Value::Int(4)),
                (DynamicIndex::Index(1), Value::Int(8)),
            ]
        );
        assert!(list.is_empty());
    }

    #[test]
    fn default_values_follow_element_type() {
        let sentinel = |element| Collection::new(CollectionKind::Array, element).default_value();
        assert_eq!(sentinel(ElementType::Schema(0)), Value::Null);
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::String)), Value::Null);
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::Number)), Value::Float(0.0));
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::Float32)), Value::Float(0.0));
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::Int8)), Value::Int(0));
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::Uint64)), Value::UInt(0));
        assert_eq!(sentinel(ElementType::Primitive(PrimitiveType::Boolean)), Value::Bool(false));
    }

    #[test]
    fn clone_empty_keeps_shape() {
        let mut map = map_of_players();
        map.set_value(0, DynamicIndex::from("a"), Value::Ref(RefId::new(5)));
        let copy = map.clone_empty();
        assert!(copy.is_empty());
        assert_eq!(copy.kind(), CollectionKind::Map);
        assert_eq!(copy.element(), ElementType::Schema(1));
        assert!(copy.has_schema_child());
    }

    #[test]
    fn move_listeners_transfers_all() {
        let mut old = map_of_players();
        old.listeners.on_add.push(Box::new(|_, _, _| {}));
        old.listeners.on_remove.push(Box::new(|_, _, _| {}));
        let mut new = old.clone_empty();
        assert_eq!(new.listener_count(), 0);
        new.move_listeners(&mut old);
        assert_eq!(new.listener_count(), 2);
        assert_eq!(old.listener_count(), 0);
    }
}
