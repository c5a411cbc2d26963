//! # Cell Benchmarks
//!
//! Measures the memory-mapped store: attach cost (paid once per peer on
//! every propagation) and raw record access.
//!
//! Run: `cargo bench --bench cell_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qlink_cell::{CellName, CellStore, OpenMode, Outcome, ShmStore};

fn bench_shm(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = ShmStore::new(dir.path()).unwrap();
    let name = CellName::new("bench_cell").unwrap();
    let region = store.open(&name, 1, OpenMode::Create).unwrap().region;

    let mut group = c.benchmark_group("shm");

    group.bench_function("lookup", |b| b.iter(|| black_box(store.lookup(&name).unwrap())));

    group.bench_function("amplitudes", |b| b.iter(|| black_box(region.amplitudes())));

    group.bench_function("collapse_cycle", |b| {
        b.iter(|| {
            region.clear_measurement();
            black_box(region.collapse_to(Outcome::One))
        })
    });

    group.bench_function("snapshot", |b| b.iter(|| black_box(region.snapshot())));

    group.finish();
}

criterion_group!(benches, bench_shm);
criterion_main!(benches);
