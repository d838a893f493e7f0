//! Deterministic registry hashing.

use blake3::Hasher;

use crate::{CollectionKind, ElementType, FieldType, PrimitiveType, TypeRegistry};

/// Computes a deterministic fingerprint of a registry's type layouts.
///
/// Two registries hash equal when they declare the same discriminators,
/// type names, wire indices, field names and field types.
#[must_use]
pub fn registry_hash(registry: &TypeRegistry) -> u64 {
    let mut hasher = Hasher::new();
    write_u32(&mut hasher, registry.len() as u32);

    for (id, desc) in registry.iter() {
        write_u32(&mut hasher, id);
        write_str(&mut hasher, desc.name());
        write_u32(&mut hasher, desc.len() as u32);

        for field in desc.fields() {
            write_u8(&mut hasher, field.index);
            write_str(&mut hasher, &field.name);
            write_field_type(&mut hasher, field.ty);
        }
    }

    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

fn write_field_type(hasher: &mut Hasher, ty: FieldType) {
    match ty {
        FieldType::Primitive(primitive) => {
            write_u8(hasher, 0);
            write_primitive(hasher, primitive);
        }
        FieldType::Ref(id) => {
            write_u8(hasher, 1);
            write_u32(hasher, id);
        }
        FieldType::Collection { kind, element } => {
            write_u8(
                hasher,
                match kind {
                    CollectionKind::Array => 2,
                    CollectionKind::Map => 3,
                },
            );
            match element {
                ElementType::Primitive(primitive) => {
                    write_u8(hasher, 0);
                    write_primitive(hasher, primitive);
                }
                ElementType::Schema(id) => {
                    write_u8(hasher, 1);
                    write_u32(hasher, id);
                }
            }
        }
    }
}

fn write_primitive(hasher: &mut Hasher, ty: PrimitiveType) {
    write_str(hasher, ty.name());
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}
