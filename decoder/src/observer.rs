//! Decode observer sink.

use schema::FieldIndex;

use crate::types::{DataChange, RefId};

/// Summary of one decoded patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Bytes consumed from the patch buffer.
    pub bytes: usize,
    /// Structure switches encountered.
    pub structures: usize,
    /// Data changes recorded across all targets.
    pub changes: usize,
    /// Unknown-field resynchronizations.
    pub resyncs: usize,
    /// References dropped by the sweep.
    pub collected: usize,
}

/// Receives decoder events.
///
/// Passed to the decoder at construction with
/// [`Decoder::with_observer`](crate::Decoder::with_observer). All methods
/// default to no-ops.
pub trait DecodeObserver {
    /// Called once per successful decode call, after dispatch and the sweep.
    fn patch_decoded(&mut self, _stats: &PatchStats) {}

    /// Called when a field index is unknown for the target's schema type and
    /// the decoder skipped `skipped` bytes to resynchronize.
    fn unknown_field(&mut self, _ref_id: RefId, _field_index: FieldIndex, _skipped: usize) {}

    /// Called before dispatch with each non-empty change list, in the order
    /// targets were first seen.
    fn changes_recorded(&mut self, _ref_id: RefId, _changes: &[DataChange]) {}

    /// Called with the reference ids dropped by a sweep, when there are any.
    fn collected(&mut self, _ref_ids: &[RefId]) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DecodeObserver for NoopObserver {}
