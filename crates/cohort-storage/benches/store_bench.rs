//! Checkpoint store benchmarks.
//!
//! Measures record encode/decode and a full save/load cycle for the
//! in-memory and filesystem stores.
//!
//! Run with: cargo bench --bench store_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cohort_storage::{
    CheckpointRecord, CheckpointStore, FileSystemCheckpointStore, InMemoryCheckpointStore,
    ParticipantId,
};

fn record_of_len(len: usize) -> CheckpointRecord {
    let data = (0..len as i64).map(|i| i * 10 - 7).collect();
    CheckpointRecord::new(ParticipantId(1), 42, data)
}

/// Benchmark text encoding and parsing at various vector lengths.
fn bench_record_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_codec");

    for &len in &[5, 1_000, 100_000] {
        let record = record_of_len(len);
        let text = record.encode();

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("encode", len), &record, |b, record| {
            b.iter(|| black_box(record.encode()));
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &text, |b, text| {
            b.iter(|| black_box(CheckpointRecord::decode(ParticipantId(1), text).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark a save followed by a load.
fn bench_save_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_load");
    let record = record_of_len(5);

    let memory = InMemoryCheckpointStore::new();
    group.bench_function("in_memory", |b| {
        b.iter(|| {
            memory.save(&record).unwrap();
            black_box(memory.load(ParticipantId(1)).unwrap())
        });
    });

    let dir = tempfile::tempdir().unwrap();
    let fs_store = FileSystemCheckpointStore::new(dir.path());
    group.bench_function("filesystem", |b| {
        b.iter(|| {
            fs_store.save(&record).unwrap();
            black_box(fs_store.load(ParticipantId(1)).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_record_codec, bench_save_load);
criterion_main!(benches);
