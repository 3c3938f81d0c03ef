//! Batch retrieval simulation benchmarks
//!
//! Run with: cargo bench --bench pbr_simulation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pann_stats::pbr::{count_empty_buckets, BucketSimulation, SimulationConfig};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Benchmark one allocation of n items into 2n buckets
fn bench_count_empty_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_empty_buckets");

    for n in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
            b.iter(|| black_box(count_empty_buckets(n, 2 * n, &mut rng)));
        });
    }

    group.finish();
}

/// Benchmark a full factor sweep at increasing trial counts
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbr_sweep");
    group.sample_size(20);

    for trials in [100, 1_000].iter() {
        let sim = BucketSimulation::new(SimulationConfig::default().num_trials(*trials)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(trials), trials, |b, _| {
            b.iter(|| black_box(sim.sweep().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_count_empty_buckets, bench_sweep);
criterion_main!(benches);
