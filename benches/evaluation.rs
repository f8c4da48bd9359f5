//! Benchmarks for blend evaluation and candidate enumeration.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use blend_search::{
    compute::{
        Evaluator, WeightedMeanPredictor, count_blends, enumerate, evolution::BlendRng,
        exhaustive_search,
    },
    schema::{BlendBounds, ExhaustiveConfig, Pool, TargetProfile},
};

fn synthetic_pool(size: usize) -> Pool {
    let ids = (0..size).map(|i| format!("K-{}", 1000 + i)).collect();
    let flavors = (0..size)
        .map(|i| {
            let x = i as f64;
            vec![
                4.0 + (x * 0.37) % 4.0,
                4.5 + (x * 0.53) % 3.0,
                5.0 + (x * 0.71) % 2.5,
                4.0 + (x * 0.29) % 3.5,
            ]
        })
        .collect();
    let prices = (0..size).map(|i| 1.5 + (i as f64 * 0.13) % 2.0).collect();
    Pool::from_parallel(ids, flavors, prices).expect("synthetic pool is valid")
}

fn target() -> TargetProfile {
    TargetProfile {
        flavor: vec![6.0, 6.0, 6.0, 5.5],
        color: 110.0,
    }
}

fn bench_evaluate_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_batch");

    let pool = synthetic_pool(200);
    let predictor = WeightedMeanPredictor::new(pool.dimensions());
    let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

    for size in [100, 1000, 10000] {
        let mut rng = BlendRng::new(42);
        let blends: Vec<_> = (0..size)
            .map(|_| rng.random_blend(pool.len(), &BlendBounds::default()))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| evaluator.evaluate_batch(black_box(&blends)).unwrap());
        });
    }

    group.finish();
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");

    for (pool_size, k) in [(15, 3), (15, 4), (10, 5)] {
        let available: Vec<usize> = (0..pool_size).collect();
        let expected = count_blends(0, 20, &available, k);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("n{}_k{}_{}", pool_size, k, expected)),
            &k,
            |b, &k| {
                b.iter(|| enumerate(0, black_box(20), &available, k));
            },
        );
    }

    group.finish();
}

fn bench_exhaustive(c: &mut Criterion) {
    let mut group = c.benchmark_group("exhaustive_search");
    group.sample_size(10);

    let pool = synthetic_pool(10);
    let predictor = WeightedMeanPredictor::new(pool.dimensions());
    let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
    let available: Vec<usize> = (0..pool.len()).collect();

    for max_components in [2, 3, 4] {
        let config = ExhaustiveConfig {
            max_components,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("k<={}", max_components)),
            &config,
            |b, config| {
                b.iter(|| exhaustive_search(&evaluator, 0, 20, &available, config).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate_batch, bench_enumerate, bench_exhaustive);
criterion_main!(benches);
