//! # Store Benchmarks
//!
//! Performance benchmarks for dyad-core combine and snapshot.
//!
//! Run with: `cargo bench -p dyad-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dyad_core::{SharedStore, Store, derive_id, export_canonical};
use std::hint::black_box;

/// Grow a chain: each new entity is combined with origin0.
fn create_chain(size: usize) -> Store {
    let mut store = Store::new();
    let zero = store.origin0();
    let mut last = store.origin1();
    for _ in 0..size {
        last = store.combine(last, zero);
    }
    store
}

/// Grow a fan: every step combines the two most recent entities.
fn create_fan(size: usize) -> Store {
    let mut store = Store::new();
    let (mut prev, mut last) = (store.origin0(), store.origin1());
    for _ in 0..size {
        let next = store.combine(prev, last);
        prev = last;
        last = next;
    }
    store
}

/// Grow a hub: an entity adopted from another store, combined repeatedly
/// with the newest child.
fn create_adopted_hub(size: usize) -> Store {
    let mut donor = Store::new();
    let hub = donor.combine(donor.origin0(), donor.origin1());

    let mut store = Store::new();
    let mut last = store.origin1();
    for _ in 0..size {
        last = store.combine(hub, last);
    }
    store
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_derive_id(c: &mut Criterion) {
    let store = create_chain(1);
    let ids: Vec<_> = store.snapshot().entities().iter().map(|e| e.id()).collect();

    c.bench_function("derive_id", |b| {
        b.iter(|| black_box(derive_id(black_box(ids[0]), black_box(ids[2]))));
    });
}

fn bench_combine_created(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_created");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_chain(size)));
        });
    }

    group.finish();
}

fn bench_combine_existing(c: &mut Criterion) {
    let mut store = create_fan(1000);
    let (zero, one) = (store.origin0(), store.origin1());

    c.bench_function("combine_existing", |b| {
        b.iter(|| black_box(store.combine(black_box(zero), black_box(one))));
    });
}

fn bench_shared_combine(c: &mut Criterion) {
    let shared = SharedStore::from(create_fan(1000));
    let (zero, one) = {
        let store = shared.read();
        (store.origin0(), store.origin1())
    };

    c.bench_function("shared_combine_existing", |b| {
        b.iter(|| black_box(shared.combine(black_box(one), black_box(zero))));
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for size in [100, 1000, 10000].iter() {
        let store = create_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &store, |b, store| {
            b.iter(|| black_box(store.snapshot()));
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_canonical");

    for size in [100, 1000].iter() {
        let snapshot = create_fan(*size).snapshot();
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &snapshot,
            |b, snapshot| {
                b.iter(|| black_box(export_canonical(snapshot)));
            },
        );
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    for size in [1000, 4000, 16000].iter() {
        let chain = create_chain(*size).snapshot();
        group.bench_with_input(BenchmarkId::new("chain", size), &chain, |b, snapshot| {
            b.iter(|| black_box(snapshot.verify()));
        });

        let hub = create_adopted_hub(*size).snapshot();
        group.bench_with_input(BenchmarkId::new("adopted_hub", size), &hub, |b, snapshot| {
            b.iter(|| black_box(snapshot.verify()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_derive_id,
    bench_combine_created,
    bench_combine_existing,
    bench_shared_combine,
    bench_snapshot,
    bench_export,
    bench_verify,
);
criterion_main!(benches);
