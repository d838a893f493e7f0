//! Patch construction.

use bytestream::ByteWriter;
use schema::{FieldIndex, PrimitiveType, TypeId};

use crate::types::{Operation, RefId, Value, SWITCH_TO_STRUCTURE, TYPE_ID};

/// Builds patch bytes the way a server encodes them.
///
/// Schema operations compress the operation and the wire index into one
/// byte, so only REPLACE can address wire indices of 64 and above.
///
/// ```
/// use decoder::{Operation, PatchBuilder, RefId};
///
/// let patch = PatchBuilder::new()
///     .field(Operation::Add, 0)
///     .ref_id(RefId::new(1))
///     .switch_to(RefId::new(1))
///     .item(Operation::Add, 0)
///     .key("a")
///     .ref_id(RefId::new(2))
///     .finish();
/// assert_eq!(patch[0], 0x80);
/// ```
#[derive(Debug, Default)]
pub struct PatchBuilder {
    writer: ByteWriter,
}

impl PatchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the current target structure.
    #[must_use]
    pub fn switch_to(mut self, ref_id: RefId) -> Self {
        self.writer.write_u8(SWITCH_TO_STRUCTURE);
        self.writer.write_number(f64::from(ref_id.raw()));
        self
    }

    /// Writes a compressed schema operation byte.
    #[must_use]
    pub fn field(mut self, op: Operation, index: FieldIndex) -> Self {
        self.writer.write_u8(op.raw() | index);
        self
    }

    /// Writes a collection operation byte followed by the element wire index.
    #[must_use]
    pub fn item(mut self, op: Operation, wire_index: u32) -> Self {
        self.writer.write_u8(op.raw());
        self.writer.write_number(f64::from(wire_index));
        self
    }

    /// Writes a collection CLEAR operation.
    #[must_use]
    pub fn clear(mut self) -> Self {
        self.writer.write_u8(Operation::Clear.raw());
        self
    }

    /// Writes a map key; follows an ADD item operation.
    #[must_use]
    pub fn key(self, key: &str) -> Self {
        self.string(key)
    }

    /// Writes a reference or collection value.
    #[must_use]
    pub fn ref_id(self, ref_id: RefId) -> Self {
        self.number(f64::from(ref_id.raw()))
    }

    /// Writes a type discriminator; goes between a ref id and its fields.
    #[must_use]
    pub fn type_id(mut self, type_id: TypeId) -> Self {
        self.writer.write_u8(TYPE_ID);
        self.writer.write_number(f64::from(type_id));
        self
    }

    #[must_use]
    pub fn number(mut self, value: f64) -> Self {
        self.writer.write_number(value);
        self
    }

    #[must_use]
    pub fn string(mut self, value: &str) -> Self {
        self.writer.write_str(value);
        self
    }

    #[must_use]
    pub fn boolean(mut self, value: bool) -> Self {
        self.writer.write_bool(value);
        self
    }

    /// Writes a value with the encoding of a primitive type.
    ///
    /// Mismatched values are written as the type's zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn primitive(mut self, ty: PrimitiveType, value: &Value) -> Self {
        let int = value.as_i64().unwrap_or_default();
        let uint = value.as_u64().unwrap_or_default();
        let float = value.as_f64().unwrap_or_default();
        let w = &mut self.writer;
        match ty {
            PrimitiveType::String => w.write_str(value.as_str().unwrap_or_default()),
            PrimitiveType::Number => w.write_number(float),
            PrimitiveType::Boolean => w.write_bool(value.as_bool().unwrap_or_default()),
            PrimitiveType::Int8 => w.write_i8(int as i8),
            PrimitiveType::Uint8 => w.write_u8(uint as u8),
            PrimitiveType::Int16 => w.write_i16(int as i16),
            PrimitiveType::Uint16 => w.write_u16(uint as u16),
            PrimitiveType::Int32 => w.write_i32(int as i32),
            PrimitiveType::Uint32 => w.write_u32(uint as u32),
            PrimitiveType::Int64 => w.write_i64(int),
            PrimitiveType::Uint64 => w.write_u64(uint),
            PrimitiveType::Float32 => w.write_f32(float as f32),
            PrimitiveType::Float64 => w.write_f64(float),
        }
        self
    }

    /// Appends raw bytes.
    #[must_use]
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.writer.write_bytes(bytes);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_and_field_bytes() {
        let bytes = PatchBuilder::new()
            .switch_to(RefId::new(3))
            .field(Operation::Replace, 2)
            .number(5.0)
            .finish();
        assert_eq!(bytes, [0xFF, 3, 2, 5]);
    }

    #[test]
    fn compressed_operations() {
        let bytes = PatchBuilder::new()
            .field(Operation::Add, 1)
            .field(Operation::Delete, 1)
            .field(Operation::DeleteAndAdd, 1)
            .finish();
        assert_eq!(bytes, [0x81, 0x41, 0xC1]);
    }

    #[test]
    fn item_and_key() {
        let bytes = PatchBuilder::new()
            .item(Operation::Add, 0)
            .key("a")
            .ref_id(RefId::new(2))
            .clear()
            .finish();
        assert_eq!(bytes, [0x80, 0, 0xa1, b'a', 2, 0x0A]);
    }

    #[test]
    fn type_discriminator() {
        let bytes = PatchBuilder::new().ref_id(RefId::new(4)).type_id(7).finish();
        assert_eq!(bytes, [4, 0xD5, 7]);
    }

    #[test]
    fn primitive_widths() {
        let builder = PatchBuilder::new()
            .primitive(PrimitiveType::Int16, &Value::Int(-2))
            .primitive(PrimitiveType::Uint32, &Value::UInt(1))
            .primitive(PrimitiveType::Boolean, &Value::Bool(true))
            .primitive(PrimitiveType::String, &Value::from("hi"));
        assert_eq!(builder.len(), 2 + 4 + 1 + 3);
        assert_eq!(
            builder.finish(),
            [0xFE, 0xFF, 1, 0, 0, 0, 1, 0xa2, b'h', b'i']
        );
    }
}
