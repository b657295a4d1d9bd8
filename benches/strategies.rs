use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use round_robin_counter::{PinningPolicy, RunConfig, StrategyKind};
use std::num::NonZeroUsize;

const COMMON_TARGET: usize = 1000;
const TARGET_UNIT: usize = 1000;
const TARGET_RANGE: &[usize] = &[TARGET_UNIT, 2 * TARGET_UNIT, 4 * TARGET_UNIT, 8 * TARGET_UNIT];

fn count_to(strategy: StrategyKind, num_threads: usize, target: usize, pinning: PinningPolicy) {
    let workers = NonZeroUsize::new(num_threads).unwrap();
    let report = RunConfig::new(workers, target)
        .strategy(strategy)
        .pinning(pinning)
        .run()
        .unwrap();
    black_box(report.final_value);
}

pub fn strategy_vary_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_vary_threads");
    group.sample_size(10);

    for num_threads in 1..=num_cpus::get() {
        for strategy in StrategyKind::ALL.iter().copied() {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), num_threads),
                &num_threads,
                |b, &num_threads| {
                    b.iter(|| {
                        count_to(
                            strategy,
                            num_threads,
                            black_box(COMMON_TARGET),
                            PinningPolicy::None,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

pub fn strategy_vary_target(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_vary_target");
    group.sample_size(10);
    let num_threads = num_cpus::get().max(2);

    for target in TARGET_RANGE {
        group.throughput(Throughput::Elements(*target as u64));
        for strategy in StrategyKind::ALL.iter().copied() {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), target),
                &target,
                |b, &target| {
                    b.iter(|| count_to(strategy, num_threads, black_box(*target), PinningPolicy::None))
                },
            );
        }
    }
    group.finish();
}

pub fn pinning_effect(c: &mut Criterion) {
    let mut group = c.benchmark_group("pinning_effect");
    group.sample_size(10);
    let num_threads = num_cpus::get().max(2);

    for pinning in [PinningPolicy::None, PinningPolicy::RoundRobin].iter().copied() {
        let label = match pinning {
            PinningPolicy::None => "unpinned",
            PinningPolicy::RoundRobin => "pinned",
        };
        group.bench_function(BenchmarkId::new("lock-free", label), |b| {
            b.iter(|| {
                count_to(
                    StrategyKind::LockFree,
                    num_threads,
                    black_box(COMMON_TARGET),
                    pinning,
                )
            })
        });
    }
    group.finish();
}

criterion_group!(
    strategy_benches,
    strategy_vary_threads,
    strategy_vary_target,
    pinning_effect,
);
criterion_main!(strategy_benches);
