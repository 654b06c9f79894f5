//! Benchmarks for colfer encode/decode through the record API and derived types.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use colfer::codec;
use colfer::schema_builder::{FieldDef, SchemaBuilder};
use colfer::types::Schema;
use colfer::value::Record;
use colfer::{Colfer, ColferEq, ColferMarshal, ColferUnmarshal, Timestamp};

// ============================================================================
// Test Data
// ============================================================================

#[derive(Debug, Default, Clone, Colfer, ColferEq)]
struct Person {
    name: String,
    age: u32,
    active: bool,
}

#[derive(Debug, Default, Clone, Colfer, ColferEq)]
struct Reading {
    sensor: u64,
    value: f64,
    delta: i32,
    at: Timestamp,
}

#[derive(Debug, Default, Clone, Colfer, ColferEq)]
struct Batch {
    source: String,
    payload: Vec<u8>,
    readings: Vec<Reading>,
}

fn create_schema() -> Schema {
    SchemaBuilder::new()
        .add_struct(
            "bench",
            "Person",
            vec![
                FieldDef::new("name", "text"),
                FieldDef::new("age", "uint32"),
                FieldDef::new("active", "bool"),
            ],
        )
        .add_struct(
            "bench",
            "Reading",
            vec![
                FieldDef::new("sensor", "uint64"),
                FieldDef::new("value", "float64"),
                FieldDef::new("delta", "int32"),
                FieldDef::new("at", "timestamp"),
            ],
        )
        .add_struct(
            "bench",
            "Batch",
            vec![
                FieldDef::new("source", "text"),
                FieldDef::new("payload", "binary"),
                FieldDef::list("readings", "Reading"),
            ],
        )
        .build()
        .unwrap()
}

fn make_reading(i: usize) -> Reading {
    Reading {
        sensor: 1_000 + i as u64,
        value: i as f64 * 0.25,
        delta: i as i32 - 50,
        at: Timestamp::new(1_700_000_000 + i as i64, (i * 1_000) as u32),
    }
}

fn make_batch(n: usize) -> Batch {
    Batch {
        source: "station-7".into(),
        payload: vec![0xa5; 256],
        readings: (0..n).map(make_reading).collect(),
    }
}

fn person_record(schema: &Schema) -> Record {
    let ty = schema.get_type("bench.Person").unwrap();
    Record::from_fields(
        ty,
        vec![("name", "Alice".into()), ("age", 30u32.into()), ("active", true.into())],
    )
    .unwrap()
}

fn batch_record(schema: &Schema, n: usize) -> Record {
    let batch = schema.get_type("bench.Batch").unwrap();
    let reading = schema.get_type("bench.Reading").unwrap();
    let readings: Vec<Record> = (0..n)
        .map(|i| {
            let r = make_reading(i);
            Record::from_fields(
                reading,
                vec![
                    ("sensor", r.sensor.into()),
                    ("value", r.value.into()),
                    ("delta", r.delta.into()),
                    ("at", r.at.into()),
                ],
            )
            .unwrap()
        })
        .collect();
    Record::from_fields(
        batch,
        vec![
            ("source", "station-7".into()),
            ("payload", vec![0xa5u8; 256].into()),
            ("readings", readings.into()),
        ],
    )
    .unwrap()
}

// ============================================================================
// Encode Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let schema = create_schema();

    let person_type = schema.get_type("bench.Person").unwrap();
    let mut person = person_record(&schema);
    group.throughput(Throughput::Elements(1));
    group.bench_function("person/record_api", |b| {
        b.iter(|| codec::encode(black_box(&schema), person_type, black_box(&mut person)).unwrap())
    });

    let mut person = Person {
        name: "Alice".into(),
        age: 30,
        active: true,
    };
    group.bench_function("person/derive", |b| {
        b.iter(|| black_box(&mut person).colfer_encode().unwrap())
    });

    let batch_type = schema.get_type("bench.Batch").unwrap();
    for size in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        let mut record = batch_record(&schema, size);
        group.bench_with_input(BenchmarkId::new("batch/record_api", size), &size, |b, _| {
            b.iter(|| codec::encode(black_box(&schema), batch_type, black_box(&mut record)).unwrap())
        });

        let mut batch = make_batch(size);
        group.bench_with_input(BenchmarkId::new("batch/derive", size), &size, |b, _| {
            b.iter(|| black_box(&mut batch).colfer_encode().unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// Decode Benchmarks
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let schema = create_schema();

    let person_type = schema.get_type("bench.Person").unwrap();
    let person_bytes = codec::encode(&schema, person_type, &mut person_record(&schema)).unwrap();
    group.throughput(Throughput::Elements(1));
    group.bench_function("person/record_api", |b| {
        b.iter(|| codec::decode(black_box(&schema), person_type, black_box(&person_bytes)).unwrap())
    });
    group.bench_function("person/derive", |b| {
        b.iter(|| Person::colfer_decode(black_box(&person_bytes)).unwrap())
    });

    let batch_type = schema.get_type("bench.Batch").unwrap();
    for size in [10usize, 100, 1000] {
        let bytes = make_batch(size).colfer_encode().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("batch/record_api", size), &bytes, |b, data| {
            b.iter(|| codec::decode(black_box(&schema), batch_type, black_box(data)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("batch/derive", size), &bytes, |b, data| {
            b.iter(|| Batch::colfer_decode(black_box(data)).unwrap())
        });
    }

    group.finish();
}

// ============================================================================
// Buffer Reuse
// ============================================================================

fn bench_marshal_into_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal");
    let mut batch = make_batch(100);
    let mut buf = vec![0u8; 64 * 1024];

    group.bench_function("batch_100/reused_buffer", |b| {
        b.iter(|| {
            let end = batch.marshal(black_box(&mut buf), 0).unwrap();
            Batch::unmarshal(&buf[..end], 0).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_marshal_into_buffer,
);
criterion_main!(benches);
