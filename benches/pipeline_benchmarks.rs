use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lazyweld::prelude::*;
use std::hint::black_box;

fn bench_sequential_vs_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_vs_parallel");

    for size in [1_000i64, 100_000, 1_000_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, &size| {
            b.iter(|| {
                Pipeline::range(0..size)
                    .filter(|n| n % 3 != 0)
                    .map(|n| black_box(n * 2))
                    .fold(0, |a, b| a + b)
                    .unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), size, |b, &size| {
            b.iter(|| {
                Pipeline::range(0..size)
                    .parallel()
                    .filter(|n| n % 3 != 0)
                    .map(|n| black_box(n * 2))
                    .fold(0, |a, b| a + b)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_collectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("collectors");
    let size = 100_000i64;
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("to_list", |b| {
        b.iter(|| Pipeline::range(0..size).collect(collectors::to_list()).unwrap());
    });

    group.bench_function("grouping_by_counting", |b| {
        b.iter(|| {
            Pipeline::range(0..size)
                .collect(collectors::grouping_by(|n: &i64| n % 16, collectors::counting()))
                .unwrap()
        });
    });

    group.bench_function("joining", |b| {
        b.iter(|| {
            Pipeline::range(0..size)
                .map(|n| n.to_string())
                .collect(collectors::joining_with(","))
                .unwrap()
        });
    });

    group.bench_function("parallel_grouping_by_counting", |b| {
        b.iter(|| {
            Pipeline::range(0..size)
                .parallel()
                .collect(collectors::grouping_by(|n: &i64| n % 16, collectors::counting()))
                .unwrap()
        });
    });

    group.finish();
}

fn bench_barriers(c: &mut Criterion) {
    let mut group = c.benchmark_group("barriers");

    for size in [10_000i64, 100_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(format!("sorted_{}", label), size), size, |b, &size| {
                b.iter(|| {
                    let pipeline = Pipeline::range(0..size).map(|n| (n * 7919) % 10_007);
                    let pipeline = if parallel { pipeline.parallel() } else { pipeline };
                    pipeline.sorted().limit(100).to_vec().unwrap()
                });
            });

            group.bench_with_input(BenchmarkId::new(format!("distinct_{}", label), size), size, |b, &size| {
                b.iter(|| {
                    let pipeline = Pipeline::range(0..size).map(|n| n % 1000);
                    let pipeline = if parallel { pipeline.parallel() } else { pipeline };
                    pipeline.distinct().count().unwrap()
                });
            });
        }
    }

    group.finish();
}

fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");

    for limit in [10usize, 1000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("generate_limit", limit), limit, |b, &limit| {
            b.iter(|| {
                let mut next = 0u64;
                generate(move || {
                    next += 1;
                    next
                })
                .limit(black_box(limit))
                .count()
                .unwrap()
            });
        });
    }

    group.bench_function("any_match_early", |b| {
        b.iter(|| Pipeline::range(0..1_000_000).any_match(|n| *n == 42).unwrap());
    });

    group.finish();
}

fn bench_async_demand(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_demand");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for batch_size in [1usize, 10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("collect_async", batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    runtime.block_on(async {
                        Pipeline::from_async(StreamSource::new(tokio_stream::iter(0..10_000u32)))
                            .demand_batch_size(black_box(batch_size))
                            .map(|n| n * 2)
                            .collect_async(collectors::counting())
                            .await
                            .unwrap()
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_vs_parallel,
    bench_collectors,
    bench_barriers,
    bench_short_circuit,
    bench_async_demand
);
criterion_main!(benches);
