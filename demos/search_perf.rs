//! Quick search performance test

use blend_search::{
    compute::{Evaluator, WeightedMeanPredictor, evolution::EvolutionEngine, exhaustive_search},
    schema::{ExhaustiveConfig, Pool, PopulationConfig, SearchConfig, TargetProfile},
};
use std::time::Instant;

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

fn main() {
    env_logger::init();

    let target = TargetProfile {
        flavor: vec![6.0, 6.0, 6.0, 5.5],
        color: 110.0,
    };

    println!("=== Evolutionary Search Performance Test ===\n");

    // Test different pool sizes
    for pool_size in [20, 100, 500] {
        println!("Pool size: {}", pool_size);

        let pool = synthetic_pool(pool_size);
        let predictor = WeightedMeanPredictor::new(pool.dimensions());
        let evaluator = Evaluator::new(&pool, &predictor, target.clone(), 0.0003)
            .expect("target matches pool");

        let config = SearchConfig {
            population: PopulationConfig {
                size: 500,
                max_generations: 20,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        };

        let start = Instant::now();
        let mut engine = EvolutionEngine::new(config, &evaluator).expect("valid config");
        let result = engine.run().expect("search succeeds");
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.4}", result.stats.best_fitness);
        println!("  Hall of fame:   {}", result.hall_of_fame.len());
        println!();
    }

    println!("=== Exhaustive Search Scalability (pool of 10) ===\n");

    let pool = synthetic_pool(10);
    let predictor = WeightedMeanPredictor::new(pool.dimensions());
    let evaluator =
        Evaluator::new(&pool, &predictor, target, 0.0003).expect("target matches pool");
    let available: Vec<usize> = (0..pool.len()).collect();

    // Test increasing blend sizes
    for max_components in [2, 3, 4, 5] {
        let config = ExhaustiveConfig {
            max_components,
            ..Default::default()
        };

        let start = Instant::now();
        let result =
            exhaustive_search(&evaluator, 0, 20, &available, &config).expect("search succeeds");
        let elapsed = start.elapsed();

        println!(
            "k <= {}: {} blends in {:.2}s ({:.1} evals/sec), {} within cutoff",
            max_components,
            result.evaluated,
            elapsed.as_secs_f64(),
            result.evaluated as f64 / elapsed.as_secs_f64(),
            result.len()
        );
    }
}
