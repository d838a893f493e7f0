//! Patch decoding state machine.

use std::fmt;
use std::sync::Arc;

use bytestream::ByteReader;
use schema::{CollectionKind, ElementType, FieldIndex, FieldType, PrimitiveType, TypeId, TypeRegistry};
use tracing::{debug, trace, warn};

use crate::collection::{Collection, WireIndex};
use crate::dispatch::{self, ChangeSet};
use crate::error::{DecodeError, DecodeResult, LimitKind};
use crate::instance::SchemaInstance;
use crate::limits::{DecoderConfig, DecoderLimits, ListenerPolicy};
use crate::listener::ListenerScope;
use crate::observer::{DecodeObserver, NoopObserver, PatchStats};
use crate::refs::{Ref, ReferenceTracker};
use crate::snapshot::{self, StateNode};
use crate::types::{
    compressed_field_index, DataChange, DynamicIndex, Operation, RefId, RefKind, Value,
    SWITCH_TO_STRUCTURE, TYPE_ID,
};

/// Client-side state decoder.
///
/// Owns the decoded object graph. Each call to [`decode`](Self::decode)
/// applies one patch, dispatches the recorded changes to listeners and then
/// sweeps references no longer reachable from the root.
///
/// # Example
///
/// ```
/// use decoder::{Decoder, Operation, PatchBuilder, RefId, Value};
/// use schema::{FieldType, SchemaDescriptor, TypeRegistry};
///
/// let registry = TypeRegistry::new()
///     .with(0, SchemaDescriptor::builder("State")
///         .field(0, "round", FieldType::number())
///         .build()?)?;
///
/// let mut decoder = Decoder::new(registry, 0)?;
/// let patch = PatchBuilder::new()
///     .field(Operation::Add, 0)
///     .number(3.0)
///     .finish();
/// decoder.decode(&patch)?;
///
/// assert_eq!(decoder.field(RefId::ROOT, "round"), Some(&Value::Float(3.0)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Decoder {
    registry: Arc<TypeRegistry>,
    root_type: TypeId,
    tracker: ReferenceTracker,
    config: DecoderConfig,
    observer: Box<dyn DecodeObserver>,
}

impl Decoder {
    /// Creates a decoder with default configuration.
    ///
    /// The registry is validated and `root_type` must be registered.
    pub fn new(registry: impl Into<Arc<TypeRegistry>>, root_type: TypeId) -> DecodeResult<Self> {
        Self::with_config(registry, root_type, DecoderConfig::default())
    }

    pub fn with_config(
        registry: impl Into<Arc<TypeRegistry>>,
        root_type: TypeId,
        config: DecoderConfig,
    ) -> DecodeResult<Self> {
        let registry = registry.into();
        registry.validate()?;
        let root = SchemaInstance::new(root_type, registry.resolve(root_type)?);

        let mut tracker = ReferenceTracker::new();
        tracker.add(RefId::ROOT, Ref::Schema(root), false);

        Ok(Self {
            registry,
            root_type,
            tracker,
            config,
            observer: Box::new(NoopObserver),
        })
    }

    /// Replaces the observer sink.
    #[must_use]
    pub fn with_observer(mut self, observer: impl DecodeObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn root_type(&self) -> TypeId {
        self.root_type
    }

    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    #[must_use]
    pub const fn tracker(&self) -> &ReferenceTracker {
        &self.tracker
    }

    /// Returns the root state.
    #[must_use]
    pub fn root(&self) -> Option<&SchemaInstance> {
        self.tracker.schema(RefId::ROOT)
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

    /// Decodes one patch from the start of `bytes`.
    pub fn decode(&mut self, bytes: &[u8]) -> DecodeResult<PatchStats> {
        let mut offset = 0;
        self.decode_at(bytes, &mut offset)
    }

    /// Decodes one patch starting at `offset`.
    ///
    /// On return `offset` holds the position where decoding stopped, which is
    /// the end of the buffer on success and the failing read on error.
    pub fn decode_at(&mut self, bytes: &[u8], offset: &mut usize) -> DecodeResult<PatchStats> {
        let limits = &self.config.limits;
        if bytes.len() > limits.max_patch_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::PatchBytes,
                limit: limits.max_patch_bytes,
                actual: bytes.len(),
            });
        }

        let start = (*offset).min(bytes.len());
        let mut reader = ByteReader::at(bytes, start);
        let mut patch = PatchDecoder::new(&self.registry, &mut self.tracker, limits);
        let result = patch.run(&mut reader);
        *offset = reader.offset();

        let PatchDecoder {
            changes,
            structures,
            unknown,
            handoffs,
            ..
        } = patch;
        for &(ref_id, field_index, skipped) in &unknown {
            self.observer.unknown_field(ref_id, field_index, skipped);
        }
        if let Err(err) = result {
            self.hand_off(&handoffs);
            return Err(err);
        }

        for (&ref_id, list) in &changes {
            if !list.is_empty() {
                self.observer.changes_recorded(ref_id, list);
            }
        }
        let failures = dispatch::dispatch(&mut self.tracker, &changes);
        self.hand_off(&handoffs);
        let collected = self.tracker.garbage_collect();
        if !collected.is_empty() {
            self.observer.collected(&collected);
        }

        let stats = PatchStats {
            bytes: *offset - start,
            structures,
            changes: changes.values().map(Vec::len).sum(),
            resyncs: unknown.len(),
            collected: collected.len(),
        };
        debug!(
            bytes = stats.bytes,
            changes = stats.changes,
            collected = stats.collected,
            refs = self.tracker.len(),
            "decoded patch"
        );
        self.observer.patch_decoded(&stats);

        self.check_failures(failures)?;
        Ok(stats)
    }

    /// Replays the current graph to listeners as ADD changes.
    ///
    /// Every schema field and collection element reachable from the root is
    /// reported once, parents before children.
    pub fn trigger_all(&mut self) -> DecodeResult<()> {
        let failures = dispatch::replay(&mut self.tracker);
        debug!(refs = self.tracker.len(), failures, "replayed state");
        self.check_failures(failures)
    }

    /// Drops all decoded state. Root listeners are kept.
    pub fn reset(&mut self) -> DecodeResult<()> {
        let mut root = SchemaInstance::new(self.root_type, self.registry.resolve(self.root_type)?);
        if let Some(old) = self.tracker.schema_mut(RefId::ROOT) {
            root.absorb_listeners(old.take_listeners());
        }
        self.tracker.reset_to(root);
        Ok(())
    }

    /// Captures the graph reachable from the root.
    #[must_use]
    pub fn snapshot(&self) -> StateNode {
        snapshot::capture(&self.tracker, RefId::ROOT)
    }

    /// Registers a change listener on a schema instance.
    pub fn on_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&[DataChange], &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_change(ref_id, listener)
    }

    /// Registers a removal listener on a schema instance.
    pub fn on_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_remove(ref_id, listener)
    }

    /// Registers an element-added listener on a collection.
    pub fn on_add(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_add(ref_id, listener)
    }

    /// Registers an element-changed listener on a collection.
    pub fn on_item_change(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_item_change(ref_id, listener)
    }

    /// Registers an element-removed listener on a collection.
    ///
    /// The listener receives the removed value.
    pub fn on_item_remove(
        &mut self,
        ref_id: RefId,
        listener: impl FnMut(&Value, &DynamicIndex, &mut ListenerScope<'_>) + 'static,
    ) -> DecodeResult<()> {
        self.tracker.on_item_remove(ref_id, listener)
    }

    /// Moves removal listeners of replaced schema instances to their
    /// replacements once the old instances' removal has been dispatched.
    fn hand_off(&mut self, handoffs: &[(RefId, RefId)]) {
        for &(from, to) in handoffs {
            let Some(moved) = self
                .tracker
                .schema_mut(from)
                .map(|old| std::mem::take(&mut old.listeners.on_remove))
            else {
                continue;
            };
            if let Some(new) = self.tracker.schema_mut(to) {
                new.listeners.on_remove.extend(moved);
            }
        }
    }

    fn check_failures(&self, failures: usize) -> DecodeResult<()> {
        if failures > 0 && self.config.listener_policy == ListenerPolicy::Report {
            return Err(DecodeError::ListenersFailed { failures });
        }
        Ok(())
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("root_type", &self.root_type)
            .field("types", &self.registry.len())
            .field("refs", &self.tracker.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// State of one decode call.
struct PatchDecoder<'d> {
    registry: &'d TypeRegistry,
    tracker: &'d mut ReferenceTracker,
    limits: &'d DecoderLimits,
    current: RefId,
    changes: ChangeSet,
    structures: usize,
    unknown: Vec<(RefId, FieldIndex, usize)>,
    /// Replaced schema instances and their replacements.
    handoffs: Vec<(RefId, RefId)>,
}

impl<'d> PatchDecoder<'d> {
    fn new(
        registry: &'d TypeRegistry,
        tracker: &'d mut ReferenceTracker,
        limits: &'d DecoderLimits,
    ) -> Self {
        Self {
            registry,
            tracker,
            limits,
            current: RefId::ROOT,
            changes: ChangeSet::new(),
            structures: 0,
            unknown: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    fn run(&mut self, reader: &mut ByteReader<'_>) -> DecodeResult<()> {
        self.changes.entry(RefId::ROOT).or_default();

        while !reader.is_empty() {
            let offset = reader.offset();
            let byte = reader.read_u8()?;

            if byte == SWITCH_TO_STRUCTURE {
                let ref_id = read_ref_id(reader)?;
                if !self.tracker.has(ref_id) {
                    return Err(DecodeError::RefNotFound { ref_id, offset });
                }
                trace!(ref_id = ref_id.raw(), offset, "switch to structure");
                self.current = ref_id;
                self.changes.entry(ref_id).or_default();
                self.structures += 1;
                continue;
            }

            match self.tracker.get(self.current).map(Ref::kind) {
                Some(RefKind::Schema) => self.schema_operation(reader, byte)?,
                Some(RefKind::Collection) => self.collection_operation(reader, byte, offset)?,
                None => {
                    return Err(DecodeError::RefNotFound {
                        ref_id: self.current,
                        offset,
                    })
                }
            }
        }
        Ok(())
    }

    fn schema_operation(&mut self, reader: &mut ByteReader<'_>, byte: u8) -> DecodeResult<()> {
        let target = self.current;
        let op = Operation::from_compressed(byte);
        let field_index = compressed_field_index(byte, op);

        let Some(instance) = self.tracker.schema(target) else {
            return Err(DecodeError::KindMismatch {
                ref_id: target,
                expected: RefKind::Schema,
            });
        };
        let descriptor = instance.descriptor_arc();
        let (Some(slot), Some(field)) = (
            descriptor.slot_of_index(field_index),
            descriptor.field_by_index(field_index),
        ) else {
            self.resync(reader, field_index);
            return Ok(());
        };
        let previous = instance.value(slot).cloned().unwrap_or_default();

        if op.has_delete() {
            if let Some(child) = previous.as_ref_id() {
                self.tracker.remove(child);
            }
        }

        let value = if op == Operation::Delete {
            Value::Null
        } else {
            match field.ty {
                FieldType::Primitive(primitive) => self.read_primitive(reader, primitive)?,
                FieldType::Ref(declared) => self.decode_ref(reader, op, declared, &previous)?,
                FieldType::Collection { kind, element } => {
                    self.decode_collection_ref(reader, kind, element, &previous)?
                }
            }
        };

        if let Some(instance) = self.tracker.schema_mut(target) {
            instance.set(slot, value.clone());
        }
        if value != previous {
            self.record(
                target,
                DataChange {
                    op,
                    field: Some(field.name.clone()),
                    dynamic_index: None,
                    value,
                    previous_value: previous,
                },
            );
        }
        Ok(())
    }

    fn collection_operation(
        &mut self,
        reader: &mut ByteReader<'_>,
        byte: u8,
        offset: usize,
    ) -> DecodeResult<()> {
        let target = self.current;
        let op = Operation::from_raw(byte).ok_or(DecodeError::InvalidOperation {
            ref_id: target,
            op: byte,
            offset,
        })?;
        if op == Operation::Clear {
            self.clear_collection(target);
            return Ok(());
        }

        let index_offset = reader.offset();
        let wire_index: WireIndex = number_to_u32(reader.read_number()?)
            .ok_or(DecodeError::InvalidWireIndex {
                offset: index_offset,
            })?;

        let Some(collection) = self.tracker.collection(target) else {
            return Err(DecodeError::KindMismatch {
                ref_id: target,
                expected: RefKind::Collection,
            });
        };
        let kind = collection.kind();
        let element = collection.element();
        let previous = collection.get_by_wire_index(wire_index);
        let occupied = collection.contains_wire_index(wire_index);
        let known_index = collection.index_for(wire_index).cloned();

        let dynamic_index = match kind {
            CollectionKind::Array => DynamicIndex::Index(wire_index as usize),
            CollectionKind::Map if op.has_add() => DynamicIndex::Key(self.read_string(reader)?),
            CollectionKind::Map => match known_index {
                Some(index) => index,
                None if op == Operation::Delete => {
                    trace!(ref_id = target.raw(), wire_index, "delete of unknown index");
                    return Ok(());
                }
                None => {
                    return Err(DecodeError::IndexNotFound {
                        ref_id: target,
                        wire_index,
                    })
                }
            },
        };

        if op.has_delete() {
            if let Some(child) = previous.as_ref_id() {
                self.tracker.remove(child);
            }
            if op != Operation::DeleteAndAdd {
                if let Some(collection) = self.tracker.collection_mut(target) {
                    collection.delete(wire_index);
                }
            }
        }

        let value = if op == Operation::Delete {
            Value::Null
        } else {
            let value = match element {
                ElementType::Schema(declared) => self.decode_ref(reader, op, declared, &previous)?,
                ElementType::Primitive(primitive) => self.read_primitive(reader, primitive)?,
            };
            if let Some(collection) = self.tracker.collection_mut(target) {
                collection.set_value(wire_index, dynamic_index.clone(), value.clone());
            }
            value
        };

        let has_change = if op == Operation::Delete {
            occupied
        } else {
            value != previous || (op.has_add() && !occupied)
        };
        if has_change {
            // A DELETE_AND_ADD on an empty slot removed nothing.
            let op = if op == Operation::DeleteAndAdd && !occupied {
                Operation::Add
            } else {
                op
            };
            self.record(
                target,
                DataChange {
                    op,
                    field: None,
                    dynamic_index: Some(dynamic_index),
                    value,
                    previous_value: previous,
                },
            );
        }
        Ok(())
    }

    fn clear_collection(&mut self, target: RefId) {
        let Some(collection) = self.tracker.collection_mut(target) else {
            return;
        };
        for (index, previous) in collection.clear() {
            if let Some(child) = previous.as_ref_id() {
                self.tracker.remove(child);
            }
            self.record(
                target,
                DataChange {
                    op: Operation::Delete,
                    field: None,
                    dynamic_index: Some(index),
                    value: Value::Null,
                    previous_value: previous,
                },
            );
        }
    }

    /// Decodes a schema reference value.
    fn decode_ref(
        &mut self,
        reader: &mut ByteReader<'_>,
        op: Operation,
        declared: TypeId,
        previous: &Value,
    ) -> DecodeResult<Value> {
        let offset = reader.offset();
        let ref_id = read_ref_id(reader)?;

        if op == Operation::Replace {
            return match self.tracker.get(ref_id).map(Ref::kind) {
                Some(RefKind::Schema) => Ok(Value::Ref(ref_id)),
                Some(RefKind::Collection) => Err(DecodeError::KindMismatch {
                    ref_id,
                    expected: RefKind::Schema,
                }),
                None => Err(DecodeError::RefNotFound { ref_id, offset }),
            };
        }

        let type_id = self.read_type_id(reader, declared)?;
        match self.tracker.get(ref_id).map(Ref::kind) {
            Some(RefKind::Schema) => {
                if let Some(prev_id) = previous.as_ref_id().filter(|&id| id != ref_id) {
                    self.tracker.remove(prev_id);
                }
                self.tracker.touch(ref_id);
            }
            Some(RefKind::Collection) => {
                return Err(DecodeError::KindMismatch {
                    ref_id,
                    expected: RefKind::Schema,
                })
            }
            None => {
                let descriptor = self
                    .registry
                    .resolve(type_id)
                    .map_err(|_| DecodeError::UnknownType { type_id, offset })?;
                let mut instance = SchemaInstance::new(type_id, descriptor);
                if let Some(prev_id) = previous.as_ref_id() {
                    if let Some(prev) = self.tracker.schema_mut(prev_id) {
                        let moved = std::mem::take(&mut prev.listeners.on_change);
                        instance.listeners.on_change.extend(moved);
                        self.handoffs.push((prev_id, ref_id));
                    }
                    self.tracker.remove(prev_id);
                }
                self.track(ref_id, Ref::Schema(instance))?;
            }
        }
        Ok(Value::Ref(ref_id))
    }

    /// Reads an optional type discriminator, falling back to the declared type.
    fn read_type_id(&self, reader: &mut ByteReader<'_>, declared: TypeId) -> DecodeResult<TypeId> {
        if reader.peek_u8() != Some(TYPE_ID) {
            return Ok(declared);
        }
        let offset = reader.offset();
        reader.skip(1)?;
        let raw = reader.read_number()?;
        match number_to_u32(raw) {
            Some(type_id) if self.registry.contains(type_id) => Ok(type_id),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            other => Err(DecodeError::UnknownType {
                type_id: other.unwrap_or(raw as TypeId),
                offset,
            }),
        }
    }

    /// Decodes a collection reference value.
    ///
    /// A tracked ref id is reused in place. When the field previously held a
    /// different collection, its listeners move to the new one and a DELETE
    /// change is recorded on the new one for every element the old one held.
    fn decode_collection_ref(
        &mut self,
        reader: &mut ByteReader<'_>,
        kind: CollectionKind,
        element: ElementType,
        previous: &Value,
    ) -> DecodeResult<Value> {
        let ref_id = read_ref_id(reader)?;
        let prev_id = previous.as_ref_id().filter(|&id| id != ref_id);

        match self.tracker.get(ref_id).map(Ref::kind) {
            Some(RefKind::Collection) => self.tracker.touch(ref_id),
            Some(RefKind::Schema) => {
                return Err(DecodeError::KindMismatch {
                    ref_id,
                    expected: RefKind::Collection,
                })
            }
            None => {
                let collection = prev_id
                    .and_then(|id| self.tracker.collection(id))
                    .map_or_else(|| Collection::new(kind, element), Collection::clone_empty);
                self.track(ref_id, Ref::Collection(collection))?;
            }
        }

        let Some(prev_id) = prev_id else {
            return Ok(Value::Ref(ref_id));
        };
        let Some(prev) = self.tracker.collection_mut(prev_id) else {
            return Ok(Value::Ref(ref_id));
        };
        let listeners = prev.take_listeners();
        let items: Vec<(DynamicIndex, Value)> = prev
            .iter()
            .map(|(index, value)| (index, value.clone()))
            .collect();
        if let Some(collection) = self.tracker.collection_mut(ref_id) {
            collection.absorb_listeners(listeners);
        }
        self.tracker.remove(prev_id);

        for (index, item) in items {
            if let Some(child) = item.as_ref_id() {
                self.tracker.remove(child);
            }
            self.record(
                ref_id,
                DataChange {
                    op: Operation::Delete,
                    field: None,
                    dynamic_index: Some(index),
                    value: Value::Null,
                    previous_value: item,
                },
            );
        }
        Ok(Value::Ref(ref_id))
    }

    fn read_primitive(
        &self,
        reader: &mut ByteReader<'_>,
        primitive: PrimitiveType,
    ) -> DecodeResult<Value> {
        let value = match primitive {
            PrimitiveType::String => Value::String(self.read_string(reader)?),
            PrimitiveType::Number => Value::Float(reader.read_number()?),
            PrimitiveType::Boolean => Value::Bool(reader.read_bool()?),
            PrimitiveType::Int8 => Value::Int(i64::from(reader.read_i8()?)),
            PrimitiveType::Uint8 => Value::UInt(u64::from(reader.read_u8()?)),
            PrimitiveType::Int16 => Value::Int(i64::from(reader.read_i16()?)),
            PrimitiveType::Uint16 => Value::UInt(u64::from(reader.read_u16()?)),
            PrimitiveType::Int32 => Value::Int(i64::from(reader.read_i32()?)),
            PrimitiveType::Uint32 => Value::UInt(u64::from(reader.read_u32()?)),
            PrimitiveType::Int64 => Value::Int(reader.read_i64()?),
            PrimitiveType::Uint64 => Value::UInt(reader.read_u64()?),
            PrimitiveType::Float32 => Value::Float(f64::from(reader.read_f32()?)),
            PrimitiveType::Float64 => Value::Float(reader.read_f64()?),
        };
        Ok(value)
    }

    fn read_string(&self, reader: &mut ByteReader<'_>) -> DecodeResult<String> {
        let value = reader.read_str()?;
        if value.len() > self.limits.max_string_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::StringBytes,
                limit: self.limits.max_string_bytes,
                actual: value.len(),
            });
        }
        Ok(value.to_owned())
    }

    /// Skips ahead to the next structure switch naming a tracked reference.
    fn resync(&mut self, reader: &mut ByteReader<'_>, field_index: FieldIndex) {
        let start = reader.offset();
        while let Some(byte) = reader.peek_u8() {
            if byte == SWITCH_TO_STRUCTURE {
                let mut ahead = ByteReader::at(reader.data(), reader.offset() + 1);
                if read_ref_id(&mut ahead).is_ok_and(|id| self.tracker.has(id)) {
                    break;
                }
            }
            if reader.skip(1).is_err() {
                break;
            }
        }

        let skipped = reader.offset() - start;
        warn!(
            ref_id = self.current.raw(),
            field_index,
            skipped,
            "unknown field index, resynchronized at next known structure"
        );
        self.unknown.push((self.current, field_index, skipped));
    }

    fn track(&mut self, ref_id: RefId, obj: Ref) -> DecodeResult<()> {
        let actual = self.tracker.len() + 1;
        if actual > self.limits.max_refs {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::TrackedRefs,
                limit: self.limits.max_refs,
                actual,
            });
        }
        self.tracker.add(ref_id, obj, true);
        Ok(())
    }

    fn record(&mut self, ref_id: RefId, change: DataChange) {
        self.changes.entry(ref_id).or_default().push(change);
    }
}

fn read_ref_id(reader: &mut ByteReader<'_>) -> DecodeResult<RefId> {
    let offset = reader.offset();
    let raw = reader.read_number()?;
    number_to_u32(raw)
        .map(RefId::new)
        .ok_or(DecodeError::InvalidRefId { offset })
}

/// Converts a decoded `number` to a non-negative integer id.
#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn number_to_u32(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) && value.trunc() == value
    {
        Some(value as u32)
    } else {
        None
    }
}
