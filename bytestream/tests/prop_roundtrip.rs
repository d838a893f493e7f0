use bytestream::{ByteReader, ByteWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    U8(u8),
    I16(i16),
    U32(u32),
    I64(i64),
    F64(f64),
    Bool(bool),
    Number(i64),
    Str(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::U8),
        any::<i16>().prop_map(Op::I16),
        any::<u32>().prop_map(Op::U32),
        any::<i64>().prop_map(Op::I64),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(Op::F64),
        any::<bool>().prop_map(Op::Bool),
        (-(1i64 << 53)..(1i64 << 53)).prop_map(Op::Number),
        ".{0,300}".prop_map(Op::Str),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = ByteWriter::new();

        for op in &ops {
            match op {
                Op::U8(v) => writer.write_u8(*v),
                Op::I16(v) => writer.write_i16(*v),
                Op::U32(v) => writer.write_u32(*v),
                Op::I64(v) => writer.write_i64(*v),
                Op::F64(v) => writer.write_f64(*v),
                Op::Bool(v) => writer.write_bool(*v),
                #[allow(clippy::cast_precision_loss)]
                Op::Number(v) => writer.write_number(*v as f64),
                Op::Str(v) => writer.write_str(v),
            }
        }

        let bytes = writer.finish();
        let mut reader = ByteReader::new(&bytes);

        for op in &ops {
            match op {
                Op::U8(v) => {
                    prop_assert_eq!(reader.read_u8().unwrap(), *v);
                }
                Op::I16(v) => {
                    prop_assert_eq!(reader.read_i16().unwrap(), *v);
                }
                Op::U32(v) => {
                    prop_assert_eq!(reader.read_u32().unwrap(), *v);
                }
                Op::I64(v) => {
                    prop_assert_eq!(reader.read_i64().unwrap(), *v);
                }
                Op::F64(v) => {
                    prop_assert_eq!(reader.read_f64().unwrap(), *v);
                }
                Op::Bool(v) => {
                    prop_assert_eq!(reader.read_bool().unwrap(), *v);
                }
                #[allow(clippy::cast_precision_loss)]
                Op::Number(v) => {
                    prop_assert_eq!(reader.read_number().unwrap(), *v as f64);
                }
                Op::Str(v) => {
                    prop_assert_eq!(reader.read_str().unwrap(), v.as_str());
                }
            }
        }
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn prop_reader_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut reader = ByteReader::new(&data);
        while !reader.is_empty() {
            let before = reader.offset();
            let _ = reader.read_number();
            let _ = reader.read_str();
            if reader.offset() == before {
                reader.skip(1).unwrap();
            }
        }
    }
}
