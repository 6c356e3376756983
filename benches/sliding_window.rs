use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rollwin::{DataPoint, EngineConfig, ManualClock, SlidingWindowEngine, VolumeAverage};
use std::sync::Arc;

fn build_engine(
    clock: &Arc<ManualClock>,
) -> SlidingWindowEngine<VolumeAverage, Arc<ManualClock>> {
    SlidingWindowEngine::new(EngineConfig::new(60_000, 1_000), Arc::clone(clock)).unwrap()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in [1_000usize, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let clock = Arc::new(ManualClock::new(0));
                let engine = build_engine(&clock);
                for i in 0..size {
                    let ts = i as i64 * 25;
                    clock.set(ts);
                    engine
                        .add(black_box(&DataPoint::new(ts, (i % 997) as f64)))
                        .unwrap();
                }
                black_box(engine.current())
            });
        });
    }

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new(0));
    let engine = build_engine(&clock);
    for i in 0..100_000usize {
        let ts = i as i64 * 25;
        clock.set(ts);
        engine.add(&DataPoint::new(ts, (i % 997) as f64)).unwrap();
    }
    let now = 99_999i64 * 25;

    let mut group = c.benchmark_group("query");

    group.bench_function("current", |b| {
        b.iter(|| black_box(engine.current()));
    });

    group.bench_function("as_of_half_window_back", |b| {
        b.iter(|| black_box(engine.aggregate_as_of(now - 30_000).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_add, bench_queries);
criterion_main!(benches);
