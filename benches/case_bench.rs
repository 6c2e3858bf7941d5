//! Benchmarks for case building.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use deptrace::domain::adjacency::AdjacencyAccumulator;
use deptrace::ports::SilentReporter;
use deptrace::{CaseBuilder, DependencyRecord};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Graphs
// ═══════════════════════════════════════════════════════════════════════════

/// A single chain that closes back on its first module.
fn cycle_records(len: usize) -> Vec<DependencyRecord> {
    let mut records = vec![DependencyRecord::root("m0", ["m1"])];
    for i in 1..len {
        records.push(DependencyRecord::child(
            format!("m{}", i),
            [format!("m{}", (i + 1) % len)],
            format!("m{}", i - 1),
        ));
    }
    records
}

/// Layers of `width` modules where every module depends on every module of
/// the next layer.
fn layered_records(layers: usize, width: usize) -> Vec<DependencyRecord> {
    let mut records = Vec::new();
    let first: Vec<String> = (0..width).map(|w| format!("l0_{}", w)).collect();
    records.push(DependencyRecord::root("entry", first));
    for layer in 0..layers {
        let next: Vec<String> = (0..width).map(|w| format!("l{}_{}", layer + 1, w)).collect();
        for w in 0..width {
            records.push(DependencyRecord::child(
                format!("l{}_{}", layer, w),
                next.clone(),
                "entry",
            ));
        }
    }
    records
}

fn accumulate(records: &[DependencyRecord]) -> AdjacencyAccumulator {
    let mut acc = AdjacencyAccumulator::new();
    for record in records {
        acc.ingest(record.clone()).expect("valid record");
    }
    acc
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    for len in [1_000, 10_000] {
        let records = cycle_records(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &records, |b, records| {
            b.iter(|| black_box(accumulate(records)));
        });
    }
    group.finish();
}

fn bench_build_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_cycle");
    for len in [1_000, 10_000] {
        let acc = accumulate(&cycle_records(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &acc, |b, acc| {
            b.iter(|| {
                let mut builder = CaseBuilder::new(acc, &SilentReporter);
                black_box(builder.build_case_file(acc.roots()))
            });
        });
    }
    group.finish();
}

fn bench_build_layered(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_layered");
    for (layers, width) in [(4, 4), (6, 5)] {
        let acc = accumulate(&layered_records(layers, width));
        group.bench_with_input(
            BenchmarkId::new("layers_x_width", format!("{}x{}", layers, width)),
            &acc,
            |b, acc| {
                b.iter(|| {
                    let mut builder = CaseBuilder::new(acc, &SilentReporter);
                    black_box(builder.build_case_file(acc.roots()))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_ingest, bench_build_cycle, bench_build_layered);
criterion_main!(benches);
