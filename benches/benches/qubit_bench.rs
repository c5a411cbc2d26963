//! # Qubit Benchmarks
//!
//! Measures handle operations against the in-process store: gates,
//! measurement with and without propagation, group formation.
//!
//! Run: `cargo bench --bench qubit_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qlink_qubit::{form_group, CellStore, Gate, MemoryStore, QubitConfig, QubitHandle};
use std::sync::Arc;

fn handles(store: &Arc<dyn CellStore>, n: usize) -> Vec<QubitHandle> {
    (0..n)
        .map(|i| {
            QubitHandle::open(Arc::clone(store), format!("bench_q{i}"), QubitConfig::default().with_seed(i as u64))
                .unwrap()
        })
        .collect()
}

fn bench_gates(c: &mut Criterion) {
    let mut group = c.benchmark_group("gates");
    let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
    let qubits = handles(&store, 1);
    let q = &qubits[0];
    q.init_superposition().unwrap();

    for gate in [Gate::Hadamard, Gate::BitFlip, Gate::PhaseFlip] {
        group.bench_with_input(BenchmarkId::from_parameter(gate), &gate, |b, &gate| {
            b.iter(|| q.apply_gate(black_box(gate)).unwrap())
        });
    }

    group.finish();
}

fn bench_measure(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure");

    for size in [1usize, 2, 5] {
        let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
        let members = handles(&store, size);
        let refs: Vec<&QubitHandle> = members.iter().collect();

        group.bench_with_input(BenchmarkId::new("group", size), &size, |b, _| {
            b.iter(|| {
                if refs.len() > 1 {
                    form_group(&refs).unwrap();
                } else {
                    refs[0].init_superposition().unwrap();
                }
                black_box(refs[0].measure().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_measure_idempotent(c: &mut Criterion) {
    let store: Arc<dyn CellStore> = Arc::new(MemoryStore::new());
    let qubits = handles(&store, 1);
    let q = &qubits[0];
    q.init_superposition().unwrap();
    q.measure().unwrap();

    c.bench_function("measure_cached", |b| b.iter(|| black_box(q.measure().unwrap())));
}

criterion_group!(benches, bench_gates, bench_measure, bench_measure_idempotent);
criterion_main!(benches);
