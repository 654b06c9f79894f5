//! Encode/decode round trips through the dynamic codec.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use colfer::codec::{self, Codec};
use colfer::schema_builder::{FieldDef, SchemaBuilder};
use colfer::types::{Schema, StructType};
use colfer::value::{ColferValue, Record, Timestamp};
use colfer::Limits;
use pretty_assertions::assert_eq;

fn load_schema() -> Schema {
    SchemaBuilder::new()
        .add_struct(
            "gen",
            "O",
            vec![
                FieldDef::new("b", "bool"),
                FieldDef::new("u32", "uint32"),
                FieldDef::new("u64", "uint64"),
                FieldDef::new("i32", "int32"),
                FieldDef::new("i64", "int64"),
                FieldDef::new("f32", "float32"),
                FieldDef::new("f64", "float64"),
                FieldDef::new("t", "timestamp"),
                FieldDef::new("s", "text"),
                FieldDef::new("a", "binary"),
                FieldDef::new("o", "O"),
                FieldDef::list("os", "O"),
            ],
        )
        .add_struct(
            "gen/course",
            "Course",
            vec![
                FieldDef::new("id", "uint64"),
                FieldDef::new("name", "text"),
                FieldDef::list("lessons", "Lesson"),
                FieldDef::new("extra", "gen.O"),
            ],
        )
        .add_struct(
            "gen/course",
            "Lesson",
            vec![
                FieldDef::new("title", "text"),
                FieldDef::new("starts", "timestamp"),
            ],
        )
        .build()
        .unwrap()
}

fn roundtrip(schema: &Schema, ty: &StructType, record: &Record) -> Record {
    let mut copy = record.clone();
    let encoded = codec::encode(schema, ty, &mut copy).unwrap();
    codec::decode(schema, ty, &encoded).unwrap()
}

fn hash_of(record: &Record) -> u64 {
    let mut h = DefaultHasher::new();
    record.hash(&mut h);
    h.finish()
}

#[test]
fn test_roundtrip_extremes() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let cases: Vec<Vec<(&str, ColferValue)>> = vec![
        vec![("u32", u32::MAX.into()), ("u64", u64::MAX.into())],
        vec![("u32", 0x1f_ffffu32.into()), ("u64", ((1u64 << 49) - 1).into())],
        vec![("i32", i32::MIN.into()), ("i64", i64::MIN.into())],
        vec![("i32", i32::MAX.into()), ("i64", i64::MAX.into())],
        vec![("f32", f32::MIN_POSITIVE.into()), ("f64", f64::MAX.into())],
        vec![("f32", f32::NAN.into()), ("f64", f64::INFINITY.into())],
        vec![("t", Timestamp::new(i64::MIN, 999_999_999).into())],
        vec![("t", Timestamp::new((1 << 32) - 1, 1).into())],
        vec![("s", "\u{0}\u{7f}\u{80}\u{ffff}\u{10ffff}".into())],
        vec![("a", vec![0u8, 0x7f, 0x80, 0xff].into())],
    ];

    for fields in cases {
        let record = Record::from_fields(ty, fields).unwrap();
        assert_eq!(roundtrip(&schema, ty, &record), record);
    }
}

#[test]
fn test_roundtrip_negative_zero_is_absent() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let record = Record::from_fields(ty, vec![("f64", (-0.0f64).into())]).unwrap();
    let decoded = roundtrip(&schema, ty, &record);
    assert_eq!(decoded.get("f64"), Some(&ColferValue::Float64(0.0)));
}

#[test]
fn test_roundtrip_nested_chain() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let mut record = Record::from_fields(ty, vec![("i64", 0i64.into())]).unwrap();
    for depth in 1..=32i64 {
        record = Record::from_fields(ty, vec![("i64", depth.into()), ("o", record.into())]).unwrap();
    }

    let decoded = roundtrip(&schema, ty, &record);
    assert_eq!(decoded, record);
    assert_eq!(hash_of(&decoded), hash_of(&record));
}

#[test]
fn test_roundtrip_course() {
    let schema = load_schema();
    let course = schema.get_type("gen/course.Course").unwrap();
    let lesson = schema.get_type("Lesson").unwrap();
    let o = schema.get_type("gen.O").unwrap();

    let lessons: Vec<Record> = (0..3)
        .map(|i| {
            Record::from_fields(
                lesson,
                vec![
                    ("title", format!("Lesson {}", i).into()),
                    ("starts", Timestamp::new(1_700_000_000 + i * 3600, 0).into()),
                ],
            )
            .unwrap()
        })
        .collect();
    let extra = Record::from_fields(o, vec![("b", true.into())]).unwrap();

    let record = Record::from_fields(
        course,
        vec![
            ("id", 42u64.into()),
            ("name", "Algebra".into()),
            ("lessons", lessons.into()),
            ("extra", extra.into()),
        ],
    )
    .unwrap();

    let decoded = roundtrip(&schema, course, &record);
    assert_eq!(decoded, record);
    assert_eq!(decoded.to_string(), record.to_string());
}

#[test]
fn test_null_list_slots_decode_as_defaults() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let mut record = Record::from_fields(
        ty,
        vec![("os", ColferValue::List(vec![None, Some(Record::new(ty)), None]))],
    )
    .unwrap();
    let encoded = codec::encode(&schema, ty, &mut record).unwrap();
    let decoded = codec::decode(&schema, ty, &encoded).unwrap();

    // The encoder filled the slots, so the input now equals the output.
    assert_eq!(decoded, record);
    let items = decoded.get("os").and_then(|v| v.as_list()).unwrap();
    assert!(items.iter().all(|slot| slot.as_ref().map_or(false, Record::is_zero)));
}

#[test]
fn test_marshal_unmarshal_at_offset() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();
    let codec = Codec::with_limits(&schema, Limits::default());

    let mut first = Record::from_fields(ty, vec![("s", "first".into())]).unwrap();
    let mut second = Record::from_fields(ty, vec![("u32", 9u32.into())]).unwrap();

    let mut buf = vec![0u8; 64];
    let mid = codec.marshal(ty, &mut first, &mut buf, 2).unwrap();
    let end = codec.marshal(ty, &mut second, &mut buf, mid).unwrap();

    let (a, next) = codec.unmarshal(ty, &buf[..end], 2).unwrap();
    assert_eq!(next, mid);
    let (b, next) = codec.unmarshal(ty, &buf[..end], next).unwrap();
    assert_eq!(next, end);
    assert_eq!(a, first);
    assert_eq!(b, second);
}

#[test]
fn test_equal_records_hash_equal() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let a = Record::from_fields(ty, vec![("f32", f32::NAN.into()), ("s", "x".into())]).unwrap();
    let b = roundtrip(&schema, ty, &a);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let c = Record::from_fields(ty, vec![("s", "y".into())]).unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_roundtrip_timestamp_with_excess_nanos() {
    let schema = load_schema();
    let ty = schema.get_type("gen.O").unwrap();

    let t = Timestamp::new(0, 1_500_000_000);
    assert_eq!((t.seconds(), t.nanos()), (1, 500_000_000));

    let mut record = Record::from_fields(ty, vec![("t", t.into())]).unwrap();
    let encoded = codec::encode(&schema, ty, &mut record).unwrap();
    assert_eq!(
        encoded,
        [0x07, 0x00, 0x00, 0x00, 0x01, 0x1d, 0xcd, 0x65, 0x00, 0x7f]
    );
    let decoded = codec::decode(&schema, ty, &encoded).unwrap();
    assert_eq!(decoded, record);
    assert_eq!(decoded.get("t"), Some(&ColferValue::Timestamp(Timestamp::new(1, 500_000_000))));

    // Before the epoch, and with several whole seconds in the nanos.
    let t = Timestamp::new(-3, 4_250_000_000);
    assert_eq!((t.seconds(), t.nanos()), (1, 250_000_000));
    let record = Record::from_fields(ty, vec![("t", t.into())]).unwrap();
    assert_eq!(roundtrip(&schema, ty, &record), record);
}

#[test]
fn test_unmarshal_rejects_type_of_other_schema() {
    let schema = load_schema();
    let copy = schema.clone();
    let foreign = copy.get_type("gen/course.Course").unwrap();

    let err = Codec::new(&schema).decode(foreign, &[0x7f]).unwrap_err();
    assert!(matches!(err, colfer::error::DecodeError::ForeignType { .. }));
    assert!(Codec::new(&copy).decode(foreign, &[0x7f]).is_ok());
}
