//! Core types for the decoder.

use std::fmt;

/// Switches the current target structure; followed by a reference id.
pub const SWITCH_TO_STRUCTURE: u8 = 0xFF;

/// Precedes a type discriminator for polymorphic reference values.
pub const TYPE_ID: u8 = 0xD5;

/// A protocol-assigned reference id.
///
/// Reference ids identify every tracked schema object and collection.
/// `RefId::ROOT` always denotes the root state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RefId(u32);

impl RefId {
    /// The root state.
    pub const ROOT: Self = Self(0);

    /// Creates a new reference id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` for the root reference.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for RefId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<RefId> for u32 {
    fn from(id: RefId) -> Self {
        id.0
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Replace = 0x00,
    Delete = 0x40,
    Add = 0x80,
    DeleteAndAdd = 0xC0,
    /// Collections only: remove every element.
    Clear = 0x0A,
}

impl Operation {
    /// Returns the wire value of the operation.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Parses an uncompressed operation byte (collection targets).
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Self::Replace),
            0x40 => Some(Self::Delete),
            0x80 => Some(Self::Add),
            0xC0 => Some(Self::DeleteAndAdd),
            0x0A => Some(Self::Clear),
            _ => None,
        }
    }

    /// Extracts the operation from the top two bits of a compressed
    /// schema operation byte.
    #[must_use]
    pub const fn from_compressed(byte: u8) -> Self {
        match byte >> 6 {
            0 => Self::Replace,
            1 => Self::Delete,
            2 => Self::Add,
            _ => Self::DeleteAndAdd,
        }
    }

    /// Returns `true` if the ADD bit is set.
    #[must_use]
    pub const fn has_add(self) -> bool {
        self.raw() & Self::Add.raw() == Self::Add.raw()
    }

    /// Returns `true` if the DELETE bit is set.
    #[must_use]
    pub const fn has_delete(self) -> bool {
        self.raw() & Self::Delete.raw() == Self::Delete.raw()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Replace => "REPLACE",
            Self::Delete => "DELETE",
            Self::Add => "ADD",
            Self::DeleteAndAdd => "DELETE_AND_ADD",
            Self::Clear => "CLEAR",
        };
        f.write_str(name)
    }
}

/// Recovers the field index from a compressed schema operation byte.
///
/// The top two bits carry the operation; the remainder is taken modulo the
/// operation value, with `255` standing in for REPLACE (`0`).
#[must_use]
pub const fn compressed_field_index(byte: u8, op: Operation) -> u8 {
    let divisor = match op.raw() {
        0 => 255,
        op => op,
    };
    byte % divisor
}

/// Runtime index of a collection element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DynamicIndex {
    /// Position in an ordered list.
    Index(usize),
    /// Key in a keyed map.
    Key(String),
}

impl DynamicIndex {
    #[must_use]
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Key(_) => None,
        }
    }

    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for DynamicIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => write!(f, "{key:?}"),
        }
    }
}

impl From<usize> for DynamicIndex {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for DynamicIndex {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

/// A decoded field or element value.
///
/// Reference values compare by identity: two `Ref` values are equal only when
/// they name the same tracked instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Ref(RefId),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_ref_id(&self) -> Option<RefId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns numeric values widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            Self::UInt(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<RefId> for Value {
    fn from(id: RefId) -> Self {
        Self::Ref(id)
    }
}

/// One recorded field or element mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChange {
    pub op: Operation,
    /// Field name for schema targets.
    pub field: Option<String>,
    /// Dynamic index for collection targets.
    pub dynamic_index: Option<DynamicIndex>,
    pub value: Value,
    pub previous_value: Value,
}

/// The kind of a tracked reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Schema,
    Collection,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Collection => f.write_str("collection"),
        }
    }
}
