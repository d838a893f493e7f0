//! Change listeners and the scope handed to them.

use std::fmt;

use crate::collection::Collection;
use crate::error::DecodeResult;
use crate::instance::SchemaInstance;
use crate::refs::ReferenceTracker;
use crate::types::{DataChange, DynamicIndex, RefId, Value};

/// Receives the full change list of a schema instance.
pub type ChangeListener = Box<dyn FnMut(&[DataChange], &mut ListenerScope<'_>)>;

/// Fires when a schema instance is removed from its owner.
pub type RemoveListener = Box<dyn FnMut(&mut ListenerScope<'_>)>;

/// Receives one collection element and its dynamic index.
pub type ItemListener = Box<dyn FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>)>;

/// Listeners owned by a schema instance.
#[derive(Default)]
pub struct SchemaListeners {
    pub(crate) on_change: Vec<ChangeListener>,
    pub(crate) on_remove: Vec<RemoveListener>,
}

impl SchemaListeners {
    pub(crate) fn absorb(&mut self, other: Self) {
        self.on_change.extend(other.on_change);
        self.on_remove.extend(other.on_remove);
    }

    pub(crate) fn len(&self) -> usize {
        self.on_change.len() + self.on_remove.len()
    }
}

impl fmt::Debug for SchemaListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaListeners")
            .field("on_change", &self.on_change.len())
            .field("on_remove", &self.on_remove.len())
            .finish()
    }
}

/// Listeners owned by a collection.
#[derive(Default)]
pub struct CollectionListeners {
    pub(crate) on_add: Vec<ItemListener>,
    pub(crate) on_change: Vec<ItemListener>,
    pub(crate) on_remove: Vec<ItemListener>,
}

impl CollectionListeners {
    pub(crate) fn absorb(&mut self, other: Self) {
        self.on_add.extend(other.on_add);
        self.on_change.extend(other.on_change);
        self.on_remove.extend(other.on_remove);
    }

    pub(crate) fn len(&self) -> usize {
        self.on_add.len() + self.on_change.len() + self.on_remove.len()
    }
}

impl fmt::Debug for CollectionListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionListeners")
            .field("on_add", &self.on_add.len())
            .field("on_change", &self.on_change.len())
            .field("on_remove", &self.on_remove.len())
            .finish()
    }
}

/// Graph access handed to a running listener.
///
/// Listeners may read the decoded graph and register further listeners,
/// typically on a schema instance that was just added to a collection.
/// Listeners registered on the target currently being dispatched run from
/// the next dispatch on.
pub struct ListenerScope<'a> {
    tracker: &'a mut ReferenceTracker,
}

impl<'a> ListenerScope<'a> {
    pub(crate) fn new(tracker: &'a mut ReferenceTracker) -> Self {
        Self { tracker }
    }

    /// Returns the reference tracker.
    #[must_use]
    pub fn tracker(&self) -> &ReferenceTracker {
        self.tracker
    }

    #[must_use]
    pub fn schema(&self, ref_id: RefId) -> Option<&SchemaInstance> {
        self.tracker.schema(ref_id)
    }

    #[must_use]
    pub fn collection(&self, ref_id: RefId) -> Option<&Collection> {
        self.tracker.collection(ref_id)
    }

    /// Returns a named field of a schema instance.
    #[must_use]
    pub fn field(&self, ref_id: RefId, name: &str) -> Option<&Value> {
        self.tracker.schema(ref_id)?.get(name)
    }

    pub fn on_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&[DataChange], &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_change(ref_id, listener)
    }

    pub fn on_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_remove(ref_id, listener)
    }

    pub fn on_add(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_add(ref_id, listener)
    }

    pub fn on_item_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_item_change(ref_id, listener)
    }

    pub fn on_item_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_item_remove(ref_id, listener)
    }
}

impl fmt::Debug for ListenerScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerScope")
            .field("refs", &self.tracker.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_appends_in_order() {
        let mut a = CollectionListeners::default();
        a.on_add.push(Box::new(|_, _, _| {}));
        let mut b = CollectionListeners::default();
        b.on_add.push(Box::new(|_, _, _| {}));
        b.on_remove.push(Box::new(|_, _, _| {}));
        a.absorb(b);
        assert_eq!(a.on_add.len(), 2);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn debug_reports_counts() {
        let mut listeners = SchemaListeners::default();
        listeners.on_remove.push(Box::new(|_| {}));
        let debug = format!("{listeners:?}");
        assert!(debug.contains("on_remove: 1"));
        assert_eq!(listeners.len(), 1);
    }
}
