//! Inspection and decoding tools for deltastate patches.
//!
//! This crate provides utilities for understanding patch streams:
//!
//! - Trace the changes each patch records, per target reference
//! - Apply a sequence of patches and render the resulting state
//! - Load type registries from JSON
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the decoder is doing.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use decoder::{
    DataChange, DecodeObserver, Decoder, PatchStats, RefId, StateNode, Value,
};
use schema::{FieldIndex, TypeId, TypeRegistry};

/// Loads and validates a type registry from a JSON file.
pub fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read registry {}", path.display()))?;
    parse_registry(&contents)
}

/// Parses and validates a type registry from JSON text.
pub fn parse_registry(json: &str) -> Result<TypeRegistry> {
    let registry: TypeRegistry = serde_json::from_str(json).context("parse registry json")?;
    registry
        .validate()
        .map_err(|err| anyhow::anyhow!("registry validation failed: {err}"))?;
    Ok(registry)
}

/// One recorded change, resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLine {
    pub ref_id: RefId,
    /// Type name of the target, or `None` when it was collected by the same patch.
    pub target: Option<String>,
    pub change: DataChange,
}

/// What one patch did to the decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectReport {
    pub stats: PatchStats,
    pub changes: Vec<ChangeLine>,
    pub unknown_fields: Vec<(RefId, FieldIndex, usize)>,
    pub collected: Vec<RefId>,
}

#[derive(Default)]
struct Capture {
    lists: Vec<(RefId, Vec<DataChange>)>,
    unknown_fields: Vec<(RefId, FieldIndex, usize)>,
    collected: Vec<RefId>,
}

#[derive(Clone, Default)]
struct CaptureObserver(Rc<RefCell<Capture>>);

impl DecodeObserver for CaptureObserver {
    fn unknown_field(&mut self, ref_id: RefId, field_index: FieldIndex, skipped: usize) {
        self.0
            .borrow_mut()
            .unknown_fields
            .push((ref_id, field_index, skipped));
    }

    fn changes_recorded(&mut self, ref_id: RefId, changes: &[DataChange]) {
        self.0.borrow_mut().lists.push((ref_id, changes.to_vec()));
    }

    fn collected(&mut self, ref_ids: &[RefId]) {
        self.0.borrow_mut().collected.extend_from_slice(ref_ids);
    }
}

/// Applies `patches` in order on a fresh decoder and reports each one.
///
/// Stops at the first patch that fails to decode.
pub fn inspect_patches(
    registry: TypeRegistry,
    root_type: TypeId,
    patches: &[Vec<u8>],
) -> Result<Vec<InspectReport>> {
    let capture = CaptureObserver::default();
    let mut decoder = Decoder::new(registry, root_type)?.with_observer(capture.clone());

    let mut reports = Vec::with_capacity(patches.len());
    for (pos, patch) in patches.iter().enumerate() {
        let stats = decoder
            .decode(patch)
            .with_context(|| format!("decode patch {pos}"))?;
        let Capture {
            lists,
            unknown_fields,
            collected,
        } = std::mem::take(&mut *capture.0.borrow_mut());

        let changes = lists
            .into_iter()
            .flat_map(|(ref_id, list)| {
                let target = decoder
                    .tracker()
                    .get(ref_id)
                    .map(|obj| match obj {
                        decoder::Ref::Schema(instance) => instance.type_name().to_string(),
                        decoder::Ref::Collection(collection) => {
                            format!("{:?}", collection.kind()).to_lowercase()
                        }
                    });
                list.into_iter().map(move |change| ChangeLine {
                    ref_id,
                    target: target.clone(),
                    change,
                })
            })
            .collect();
        reports.push(InspectReport {
            stats,
            changes,
            unknown_fields,
            collected,
        });
    }
    Ok(reports)
}

/// Applies `patches` in order on a fresh decoder and snapshots the result.
pub fn decode_patches(
    registry: TypeRegistry,
    root_type: TypeId,
    patches: &[Vec<u8>],
) -> Result<StateNode> {
    let mut decoder = Decoder::new(registry, root_type)?;
    for (pos, patch) in patches.iter().enumerate() {
        decoder
            .decode(patch)
            .with_context(|| format!("decode patch {pos}"))?;
    }
    Ok(decoder.snapshot())
}

/// Renders a value the way the pretty formats print it.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(value) => value.to_string(),
        Value::Int(value) => value.to_string(),
        Value::UInt(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::String(value) => format!("{value:?}"),
        Value::Ref(id) => id.to_string(),
    }
}

/// Renders one change line.
pub fn format_change(line: &ChangeLine) -> String {
    let target = line.target.as_deref().unwrap_or("collected");
    let change = &line.change;
    let slot = match (&change.field, &change.dynamic_index) {
        (Some(field), _) => field.clone(),
        (None, Some(index)) => format!("[{index}]"),
        (None, None) => String::new(),
    };
    format!(
        "{} {target} {} {slot}: {} -> {}",
        line.ref_id,
        change.op,
        format_value(&change.previous_value),
        format_value(&change.value)
    )
}

/// Renders a state tree as indented text.
pub fn format_state_pretty(state: &StateNode) -> String {
    let mut out = String::new();
    write_node(&mut out, state, 0);
    out
}

fn write_node(out: &mut String, node: &StateNode, depth: usize) {
    match node {
        StateNode::Schema { type_name, fields } => {
            let _ = writeln!(out, "{type_name}");
            for (name, child) in fields {
                write_entry(out, name, child, depth + 1);
            }
        }
        StateNode::Array(items) => {
            let _ = writeln!(out, "array ({} items)", items.len());
            for (pos, child) in items {
                write_entry(out, &format!("[{pos}]"), child, depth + 1);
            }
        }
        StateNode::Map(entries) => {
            let _ = writeln!(out, "map ({} entries)", entries.len());
            for (key, child) in entries {
                write_entry(out, &format!("{key:?}"), child, depth + 1);
            }
        }
        StateNode::Value(value) => {
            let _ = writeln!(out, "{}", format_value(value));
        }
        StateNode::Cycle(id) => {
            let _ = writeln!(out, "<cycle to {id}>");
        }
    }
}

fn write_entry(out: &mut String, label: &str, node: &StateNode, depth: usize) {
    let _ = write!(out, "{:indent$}{label}: ", "", indent = depth * 2);
    write_node(out, node, depth);
}
