#![no_main]

use decoder::{Decoder, DecoderConfig};
use libfuzzer_sys::fuzz_target;
use schema::{ElementType, FieldType, PrimitiveType, SchemaDescriptor, TypeRegistry};

fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(
            0,
            SchemaDescriptor::builder("State")
                .field(0, "players", FieldType::map_of(ElementType::Schema(1)))
                .field(1, "boss", FieldType::reference(1))
                .field(2, "tags", FieldType::array_of(ElementType::Primitive(PrimitiveType::String)))
                .field(3, "round", FieldType::primitive(PrimitiveType::Uint16))
                .build()
                .unwrap(),
        )
        .unwrap()
        .with(
            1,
            SchemaDescriptor::builder("Player")
                .field(0, "x", FieldType::number())
                .field(1, "owner", FieldType::reference(0))
                .field(2, "scores", FieldType::map_of(ElementType::Primitive(PrimitiveType::Int32)))
                .build()
                .unwrap(),
        )
        .unwrap()
}

fuzz_target!(|data: &[u8]| {
    let mut decoder = Decoder::with_config(registry(), 0, DecoderConfig::default()).unwrap();
    let mut idx = 0usize;

    // Split the input into a bounded sequence of patches.
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 120).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let patch = &data[idx..end];
        idx = end;

        let _ = decoder.decode(patch);
        let _ = decoder.snapshot();
    }
    let _ = decoder.trigger_all();
    assert!(decoder.root().is_some());
});
