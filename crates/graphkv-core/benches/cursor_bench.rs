//! Benchmarks for result sets over multivalued databases.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use graphkv_core::{MultivaluedDatabase, RawBytes, U64BigEndian};
use graphkv_storage::backends::RedbEngine;
use graphkv_storage::{Lexicographic, StorageEngine, Transaction};

type Multi = MultivaluedDatabase<Lexicographic, Lexicographic>;

fn populated(keys: u64, values_per_key: u64) -> (RedbEngine, Multi) {
    let engine = RedbEngine::in_memory().unwrap();
    let db = Multi::new("bench", 0x02);
    {
        let mut tx = engine.begin_write().unwrap();
        for k in 0..keys {
            for v in 0..values_per_key {
                db.put(&mut tx, &k.to_be_bytes(), &v.to_be_bytes()).unwrap();
            }
        }
        tx.commit().unwrap();
    }
    (engine, db)
}

/// Benchmark walking every value of one key in both directions.
fn bench_key_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_key_scan");
    let values = 1000u64;
    let (engine, db) = populated(16, values);
    group.throughput(Throughput::Elements(values));

    group.bench_function("forward", |b| {
        b.iter(|| {
            let tx = engine.begin_read().unwrap();
            let mut cursor = db.values_of(&tx, &7u64.to_be_bytes(), U64BigEndian).unwrap();
            let mut sum = 0u64;
            while cursor.has_next().unwrap() {
                sum += cursor.next().unwrap();
            }
            black_box(sum)
        });
    });

    group.bench_function("backward", |b| {
        b.iter(|| {
            let tx = engine.begin_read().unwrap();
            let mut cursor = db.values_of(&tx, &7u64.to_be_bytes(), U64BigEndian).unwrap();
            cursor.go_after_last().unwrap();
            let mut sum = 0u64;
            while cursor.has_prev().unwrap() {
                sum += cursor.prev().unwrap();
            }
            black_box(sum)
        });
    });

    group.finish();
}

/// Benchmark positioning on values inside a key.
fn bench_goto(c: &mut Criterion) {
    let (engine, db) = populated(16, 1000);

    c.bench_function("cursor_goto", |b| {
        let tx = engine.begin_read().unwrap();
        let mut cursor = db.values_of(&tx, &3u64.to_be_bytes(), U64BigEndian).unwrap();
        let mut target = 0u64;
        b.iter(|| {
            target = (target + 397) % 1000;
            black_box(cursor.go_to(&target, false).unwrap())
        });
    });
}

/// Benchmark counting distinct keys.
fn bench_distinct_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor_distinct_keys");
    let keys = 256u64;
    let (engine, db) = populated(keys, 8);
    group.throughput(Throughput::Elements(keys));

    group.bench_function("count", |b| {
        b.iter(|| {
            let tx = engine.begin_read().unwrap();
            let mut cursor = db.keys(&tx, RawBytes).unwrap();
            black_box(cursor.count().unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_key_scan, bench_goto, bench_distinct_keys);
criterion_main!(benches);
