//! Detached snapshots of the decoded graph.

use std::collections::{BTreeMap, HashSet};

use schema::CollectionKind;

use crate::refs::{Ref, ReferenceTracker};
use crate::types::{DynamicIndex, RefId, Value};

/// An owned tree view of decoded state.
///
/// Reference ids are resolved into nested nodes, so two snapshots compare
/// equal when their states match regardless of which ids the server used.
/// A reference back to an ancestor is kept as [`StateNode::Cycle`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateNode {
    Schema {
        type_name: String,
        fields: BTreeMap<String, StateNode>,
    },
    Array(BTreeMap<usize, StateNode>),
    Map(BTreeMap<String, StateNode>),
    Value(Value),
    Cycle(RefId),
}

impl StateNode {
    /// Returns a schema field or map entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Schema { fields, .. } => fields.get(name),
            Self::Map(entries) => entries.get(name),
            _ => None,
        }
    }

    /// Returns an array element by position.
    #[must_use]
    pub fn at(&self, pos: usize) -> Option<&Self> {
        match self {
            Self::Array(items) => items.get(&pos),
            _ => None,
        }
    }

    /// Returns the primitive value of a leaf node.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Captures the graph reachable from `ref_id`.
pub(crate) fn capture(tracker: &ReferenceTracker, ref_id: RefId) -> StateNode {
    let mut path = HashSet::new();
    node(tracker, ref_id, &mut path)
}

fn node(tracker: &ReferenceTracker, ref_id: RefId, path: &mut HashSet<RefId>) -> StateNode {
    if !path.insert(ref_id) {
        return StateNode::Cycle(ref_id);
    }
    let captured = match tracker.get(ref_id) {
        Some(Ref::Schema(instance)) => StateNode::Schema {
            type_name: instance.type_name().to_string(),
            fields: instance
                .fields()
                .map(|(field, value)| (field.name.clone(), child(tracker, value, path)))
                .collect(),
        },
        Some(Ref::Collection(collection)) => match collection.kind() {
            CollectionKind::Array => StateNode::Array(
                collection
                    .iter()
                    .filter_map(|(index, value)| {
                        index.as_index().map(|pos| (pos, child(tracker, value, path)))
                    })
                    .collect(),
            ),
            CollectionKind::Map => StateNode::Map(
                collection
                    .iter()
                    .filter_map(|(index, value)| match index {
                        DynamicIndex::Key(key) => Some((key, child(tracker, value, path))),
                        DynamicIndex::Index(_) => None,
                    })
                    .collect(),
            ),
        },
        None => StateNode::Value(Value::Ref(ref_id)),
    };
    path.remove(&ref_id);
    captured
}

fn child(tracker: &ReferenceTracker, value: &Value, path: &mut HashSet<RefId>) -> StateNode {
    match value.as_ref_id() {
        Some(ref_id) => node(tracker, ref_id, path),
        None => StateNode::Value(value.clone()),
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::ser::{SerializeMap, SerializeSeq};
    use serde::{Serialize, Serializer};

    use super::StateNode;
    use crate::types::Value;

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Null => serializer.serialize_unit(),
                Self::Bool(value) => serializer.serialize_bool(*value),
                Self::Int(value) => serializer.serialize_i64(*value),
                Self::UInt(value) => serializer.serialize_u64(*value),
                Self::Float(value) => serializer.serialize_f64(*value),
                Self::String(value) => serializer.serialize_str(value),
                Self::Ref(id) => {
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry("$ref", &id.raw())?;
                    map.end()
                }
            }
        }
    }

    impl Serialize for StateNode {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Schema { fields, .. } => fields.serialize(serializer),
                Self::Map(entries) => entries.serialize(serializer),
                Self::Array(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items.values() {
                        seq.serialize_element(item)?;
                    }
                    seq.end()
                }
                Self::Value(value) => value.serialize(serializer),
                Self::Cycle(id) => {
                    let mut map = serializer.serialize_map(Some(1))?;
                    map.serialize_entry("$cycle", &id.raw())?;
                    map.end()
                }
            }
        }
    }
}
