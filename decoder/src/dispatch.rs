//! Change dispatch and graph replay.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;
use tracing::error;

use crate::listener::{ChangeListener, ItemListener, ListenerScope, RemoveListener};
use crate::refs::{Ref, ReferenceTracker};
use crate::types::{DataChange, DynamicIndex, Operation, RefId, RefKind, Value};

/// Per-reference change lists in discovery order.
pub(crate) type ChangeSet = IndexMap<RefId, Vec<DataChange>>;

/// Fires listeners for every change list in discovery order.
///
/// Returns the number of listeners that panicked.
pub(crate) fn dispatch(tracker: &mut ReferenceTracker, changes: &ChangeSet) -> usize {
    let mut dispatcher = Dispatcher {
        tracker,
        failures: 0,
    };
    for (&ref_id, list) in changes {
        if list.is_empty() {
            continue;
        }
        match dispatcher.tracker.get(ref_id).map(Ref::kind) {
            Some(RefKind::Collection) => dispatcher.collection_changes(ref_id, list),
            Some(RefKind::Schema) => dispatcher.schema_changes(ref_id, list),
            None => {}
        }
    }
    dispatcher.failures
}

/// Synthesizes ADD changes for the whole reachable graph and dispatches them.
///
/// Schema fields are replayed against [`Value::Null`]; collection elements
/// against the collection's sentinel default.
pub(crate) fn replay(tracker: &mut ReferenceTracker) -> usize {
    let changes = replay_changes(tracker);
    dispatch(tracker, &changes)
}

pub(crate) fn replay_changes(tracker: &ReferenceTracker) -> ChangeSet {
    let mut changes = ChangeSet::new();
    let mut visited = HashSet::new();
    let mut stack = vec![RefId::ROOT];

    while let Some(ref_id) = stack.pop() {
        if !visited.insert(ref_id) {
            continue;
        }
        let mut children = Vec::new();
        let list: Vec<DataChange> = match tracker.get(ref_id) {
            Some(Ref::Schema(instance)) => instance
                .fields()
                .map(|(field, value)| {
                    children.extend(value.as_ref_id());
                    DataChange {
                        op: Operation::Add,
                        field: Some(field.name.clone()),
                        dynamic_index: None,
                        value: value.clone(),
                        previous_value: Value::Null,
                    }
                })
                .collect(),
            Some(Ref::Collection(collection)) => {
                let sentinel = collection.default_value();
                collection
                    .iter()
                    .map(|(index, value)| {
                        children.extend(value.as_ref_id());
                        DataChange {
                            op: Operation::Add,
                            field: None,
                            dynamic_index: Some(index),
                            value: value.clone(),
                            previous_value: sentinel.clone(),
                        }
                    })
                    .collect()
            }
            None => continue,
        };
        changes.insert(ref_id, list);
        // Depth-first, parents before children, children in field order.
        stack.extend(children.into_iter().rev());
    }
    changes
}

struct Dispatcher<'a> {
    tracker: &'a mut ReferenceTracker,
    failures: usize,
}

impl Dispatcher<'_> {
    fn collection_changes(&mut self, ref_id: RefId, list: &[DataChange]) {
        let Some(sentinel) = self.tracker.collection(ref_id).map(|c| c.default_value()) else {
            return;
        };

        for change in list {
            let Some(index) = &change.dynamic_index else {
                continue;
            };
            self.removed_child(change);

            let previous = &change.previous_value;
            if change.op.has_delete() {
                self.item(ref_id, collection_on_remove, previous, index);
                if change.op == Operation::DeleteAndAdd {
                    self.item(ref_id, collection_on_add, &change.value, index);
                }
            } else if change.op == Operation::Add && *previous == sentinel {
                self.item(ref_id, collection_on_add, &change.value, index);
            } else if change.op == Operation::Replace || change.value != *previous {
                self.item(ref_id, collection_on_change, &change.value, index);
            }
        }
    }

    fn schema_changes(&mut self, ref_id: RefId, list: &[DataChange]) {
        for change in list {
            self.removed_child(change);
        }
        self.run(ref_id, schema_on_change, |listener: &mut ChangeListener, scope| {
            listener(list, scope);
        });
    }

    /// Fires the removal listeners of a deleted or replaced schema child.
    ///
    /// An add that swaps in a different reference removes the previous one.
    /// REPLACE only repoints the slot and removes nothing.
    fn removed_child(&mut self, change: &DataChange) {
        let Some(child) = change.previous_value.as_ref_id() else {
            return;
        };
        let replaced = change.op.has_add() && change.value.as_ref_id() != Some(child);
        if change.op.has_delete() || replaced {
            self.run(child, schema_on_remove, |listener: &mut RemoveListener, scope| {
                listener(scope);
            });
        }
    }

    fn item(
        &mut self,
        ref_id: RefId,
        slot: fn(&mut Ref) -> Option<&mut Vec<ItemListener>>,
        value: &Value,
        index: &DynamicIndex,
    ) {
        self.run(ref_id, slot, |listener: &mut ItemListener, scope| {
            listener(value, index, scope);
        });
    }

    /// Runs a listener list with panics caught per listener.
    ///
    /// The list is taken out of its owner for the duration of the call.
    /// Listeners registered on the same list meanwhile are appended after it.
    fn run<L>(
        &mut self,
        ref_id: RefId,
        slot: fn(&mut Ref) -> Option<&mut Vec<L>>,
        mut call: impl FnMut(&mut L, &mut ListenerScope<'_>),
    ) {
        let Some(mut listeners) = self.tracker.get_mut(ref_id).and_then(slot).map(std::mem::take)
        else {
            return;
        };
        if listeners.is_empty() {
            return;
        }

        let mut scope = ListenerScope::new(self.tracker);
        for listener in &mut listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(listener, &mut scope)));
            if let Err(payload) = outcome {
                self.failures += 1;
                error!(
                    ref_id = ref_id.raw(),
                    panic = panic_message(payload.as_ref()),
                    "listener panicked"
                );
            }
        }

        if let Some(current) = self.tracker.get_mut(ref_id).and_then(slot) {
            let added = std::mem::replace(current, listeners);
            current.extend(added);
        }
    }
}

fn schema_on_change(obj: &mut Ref) -> Option<&mut Vec<ChangeListener>> {
    obj.as_schema_mut().map(|instance| &mut instance.listeners.on_change)
}

fn schema_on_remove(obj: &mut Ref) -> Option<&mut Vec<RemoveListener>> {
    obj.as_schema_mut().map(|instance| &mut instance.listeners.on_remove)
}

fn collection_on_add(obj: &mut Ref) -> Option<&mut Vec<ItemListener>> {
    obj.as_collection_mut().map(|c| &mut c.listeners.on_add)
}

fn collection_on_change(obj: &mut Ref) -> Option<&mut Vec<ItemListener>> {
    obj.as_collection_mut().map(|c| &mut c.listeners.on_change)
}

fn collection_on_remove(obj: &mut Ref) -> Option<&mut Vec<ItemListener>> {
    obj.as_collection_mut().map(|c| &mut c.listeners.on_remove)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
