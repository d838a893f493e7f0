//! Reference tracking and reachability sweep.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::trace;

use crate::collection::Collection;
use crate::error::{DecodeError, DecodeResult};
use crate::instance::SchemaInstance;
use crate::listener::ListenerScope;
use crate::types::{DataChange, DynamicIndex, RefId, RefKind, Value};

/// A tracked object.
#[derive(Debug)]
pub enum Ref {
    Schema(SchemaInstance),
    Collection(Collection),
}

impl Ref {
    #[must_use]
    pub const fn kind(&self) -> RefKind {
        match self {
            Self::Schema(_) => RefKind::Schema,
            Self::Collection(_) => RefKind::Collection,
        }
    }

    #[must_use]
    pub const fn as_schema(&self) -> Option<&SchemaInstance> {
        match self {
            Self::Schema(instance) => Some(instance),
            Self::Collection(_) => None,
        }
    }

    pub fn as_schema_mut(&mut self) -> Option<&mut SchemaInstance> {
        match self {
            Self::Schema(instance) => Some(instance),
            Self::Collection(_) => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Schema(_) => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Schema(_) => None,
        }
    }
}

/// Owns every live schema instance and collection by reference id.
///
/// Entries are dropped only by [`garbage_collect`](Self::garbage_collect),
/// a full reachability sweep from [`RefId::ROOT`].
///
/// Removal marks are diagnostic. [`remove`](Self::remove) records that a
/// patch detached a reference, and [`touch`](Self::touch) or a dirty
/// [`add`](Self::add) withdraws the mark when it is attached again. The
/// sweep decides by reachability alone: an unmarked orphan is still
/// dropped and a marked reference that stayed reachable is kept. Marks can
/// be read through [`pending_removals`](Self::pending_removals) until the
/// sweep clears them.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    refs: HashMap<RefId, Ref>,
    pending_removal: BTreeSet<RefId>,
}

impl ReferenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks an object under a reference id.
    ///
    /// An already tracked id keeps its existing object. With `mark_dirty`
    /// the id is also withdrawn from the pending removals. Returns `true` if
    /// the object was inserted.
    pub fn add(&mut self, ref_id: RefId, obj: Ref, mark_dirty: bool) -> bool {
        if mark_dirty {
            self.pending_removal.remove(&ref_id);
        }
        if self.refs.contains_key(&ref_id) {
            return false;
        }
        self.refs.insert(ref_id, obj);
        true
    }

    /// Withdraws a reference id from the pending removals.
    pub fn touch(&mut self, ref_id: RefId) {
        self.pending_removal.remove(&ref_id);
    }

    #[must_use]
    pub fn get(&self, ref_id: RefId) -> Option<&Ref> {
        self.refs.get(&ref_id)
    }

    pub fn get_mut(&mut self, ref_id: RefId) -> Option<&mut Ref> {
        self.refs.get_mut(&ref_id)
    }

    #[must_use]
    pub fn has(&self, ref_id: RefId) -> bool {
        self.refs.contains_key(&ref_id)
    }

    #[must_use]
    pub fn schema(&self, ref_id: RefId) -> Option<&SchemaInstance> {
        self.get(ref_id).and_then(Ref::as_schema)
    }

    pub fn schema_mut(&mut self, ref_id: RefId) -> Option<&mut SchemaInstance> {
        self.get_mut(ref_id).and_then(Ref::as_schema_mut)
    }

    #[must_use]
    pub fn collection(&self, ref_id: RefId) -> Option<&Collection> {
        self.get(ref_id).and_then(Ref::as_collection)
    }

    pub fn collection_mut(&mut self, ref_id: RefId) -> Option<&mut Collection> {
        self.get_mut(ref_id).and_then(Ref::as_collection_mut)
    }

    /// Marks a reference as a removal candidate for the next sweep.
    ///
    /// Returns `true` if the reference was newly marked. The root is never
    /// marked.
    pub fn remove(&mut self, ref_id: RefId) -> bool {
        if ref_id.is_root() || !self.refs.contains_key(&ref_id) {
            return false;
        }
        self.pending_removal.insert(ref_id)
    }

    /// Reference ids marked since the last sweep.
    pub fn pending_removals(&self) -> impl Iterator<Item = RefId> + '_ {
        self.pending_removal.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterates over tracked reference ids in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = RefId> + '_ {
        self.refs.keys().copied()
    }

    /// Drops every entry not reachable from the root.
    ///
    /// Returns the collected reference ids in ascending order.
    pub fn garbage_collect(&mut self) -> Vec<RefId> {
        let reachable = self.reachable();
        for id in std::mem::take(&mut self.pending_removal) {
            if reachable.contains(&id) {
                trace!(ref_id = id.raw(), "detached reference still reachable");
            }
        }
        if reachable.len() == self.refs.len() {
            return Vec::new();
        }

        let mut collected: Vec<RefId> = self
            .refs
            .keys()
            .copied()
            .filter(|id| !reachable.contains(id))
            .collect();
        collected.sort_unstable();
        for id in &collected {
            self.refs.remove(id);
        }
        collected
    }

    /// Drops every entry except the root and resets its fields.
    pub(crate) fn reset_to(&mut self, root: SchemaInstance) {
        self.refs.clear();
        self.pending_removal.clear();
        self.refs.insert(RefId::ROOT, Ref::Schema(root));
    }

    fn reachable(&self) -> HashSet<RefId> {
        let mut seen = HashSet::with_capacity(self.refs.len());
        let mut stack = vec![RefId::ROOT];

        while let Some(id) = stack.pop() {
            let Some(obj) = self.refs.get(&id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            match obj {
                Ref::Schema(instance) => {
                    for (slot, _) in instance.descriptor().reference_fields() {
                        if let Some(child) = instance.value(slot).and_then(Value::as_ref_id) {
                            stack.push(child);
                        }
                    }
                }
                Ref::Collection(collection) => {
                    stack.extend(collection.values().filter_map(Value::as_ref_id));
                }
            }
        }
        seen
    }

    pub(crate) fn on_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&[DataChange], &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.expect_schema(ref_id)?
            .listeners
            .on_change
            .push(Box::new(listener));
        Ok(())
    }

    pub(crate) fn on_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.expect_schema(ref_id)?
            .listeners
            .on_remove
            .push(Box::new(listener));
        Ok(())
    }

    pub(crate) fn on_add(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.expect_collection(ref_id)?
            .listeners
            .on_add
            .push(Box::new(listener));
        Ok(())
    }

    pub(crate) fn on_item_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.expect_collection(ref_id)?
            .listeners
            .on_change
            .push(Box::new(listener));
        Ok(())
    }

    pub(crate) fn on_item_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.expect_collection(ref_id)?
            .listeners
            .on_remove
            .push(Box::new(listener));
        Ok(())
    }

    fn expect_schema(&mut self, ref_id: RefId) -> DecodeResult<&mut SchemaInstance> {
        match self.refs.get_mut(&ref_id) {
            Some(Ref::Schema(instance)) => Ok(instance),
            Some(Ref::Collection(_)) => Err(DecodeError::KindMismatch {
                ref_id,
                expected: RefKind::Schema,
            }),
            None => Err(DecodeError::RefNotFound { ref_id, offset: 0 }),
        }
    }

    fn expect_collection(&mut self, ref_id: RefId) -> DecodeResult<&mut Collection> {
        match self.refs.get_mut(&ref_id) {
            Some(Ref::Collection(collection)) => Ok(collection),
            Some(Ref::Schema(_)) => Err(DecodeError::KindMismatch {
                ref_id,
                expected: RefKind::Collection,
            }),
            None => Err(DecodeError::RefNotFound { ref_id, offset: 0 }),
        }
    }
}
