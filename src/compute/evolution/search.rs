//! Generational genetic algorithm over blends.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::schema::{
    Blend, EvolutionProgress, EvolutionResult, EvolutionStats, GenerationStats, SearchConfig,
    StopReason,
};

use crate::compute::SearchError;
use crate::compute::fitness::{Evaluation, Evaluator};
use super::archive::HallOfFame;
use super::genome::BlendRng;

/// A member of the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The blend.
    pub blend: Blend,
    /// Evaluation, `None` when the blend changed since it was last scored.
    pub evaluation: Option<Evaluation>,
}

impl Candidate {
    fn new(blend: Blend) -> Self {
        Self {
            blend,
            evaluation: None,
        }
    }

    /// Fitness, or negative infinity if not yet evaluated.
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.evaluation
            .as_ref()
            .map_or(f64::NEG_INFINITY, |e| e.fitness)
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine<'a> {
    config: SearchConfig,
    evaluator: &'a Evaluator<'a>,
    rng: BlendRng,
    population: Vec<Candidate>,
    hall_of_fame: HallOfFame,
    history: Vec<GenerationStats>,
    generation: usize,
    best_fitness: f64,
    stagnation_count: usize,
    evaluations: u64,
    cancelled: Arc<AtomicBool>,
}

impl<'a> EvolutionEngine<'a> {
    /// Create a new evolution engine. The configuration is validated here.
    pub fn new(config: SearchConfig, evaluator: &'a Evaluator<'a>) -> Result<Self, SearchError> {
        config.validate()?;
        let rng = BlendRng::from_seed_option(config.random_seed);
        let hall_of_fame = HallOfFame::from_config(&config.archive);

        Ok(Self {
            config,
            evaluator,
            rng,
            population: Vec::new(),
            hall_of_fame,
            history: Vec::new(),
            generation: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation_count: 0,
            evaluations: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle. Checked between generations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Current population.
    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Initialize the population with random blends.
    pub fn initialize(&mut self) {
        let pool_size = self.evaluator.pool_size();
        self.population = (0..self.config.population.size)
            .map(|_| Candidate::new(self.rng.random_blend(pool_size, &self.config.bounds)))
            .collect();
        self.generation = 0;
    }

    /// Evaluate every candidate without a current evaluation. Returns how many were scored.
    fn evaluate_population(&mut self) -> Result<usize, SearchError> {
        let evaluator = self.evaluator;
        let scored = self
            .population
            .par_iter_mut()
            .filter(|c| c.evaluation.is_none())
            .map(|candidate| {
                candidate.evaluation = Some(evaluator.evaluate(&candidate.blend)?);
                Ok(1)
            })
            .sum::<Result<usize, SearchError>>()?;

        self.evaluations += scored as u64;
        Ok(scored)
    }

    /// Breed the next population: tournament selection, pairwise crossover
    /// and mutation, each followed by repair.
    fn step_generation(&mut self) {
        let pool_size = self.evaluator.pool_size();
        let bounds = &self.config.bounds;
        let genetic = &self.config.genetic;

        let fitness: Vec<f64> = self.population.iter().map(Candidate::fitness).collect();
        let mut offspring: Vec<Candidate> = (0..self.population.len())
            .map(|_| {
                let idx = self.rng.select_tournament(&fitness, genetic.tournament_size);
                self.population[idx].clone()
            })
            .collect();

        for pair in offspring.chunks_exact_mut(2) {
            if self.rng.chance(genetic.crossover_rate) {
                let (left, right) = pair.split_at_mut(1);
                let (a, b) = (&mut left[0], &mut right[0]);
                self.rng.crossover(&mut a.blend, &mut b.blend);
                self.rng.repair(&mut a.blend, pool_size, bounds);
                self.rng.repair(&mut b.blend, pool_size, bounds);
                a.evaluation = None;
                b.evaluation = None;
            }
        }

        for child in &mut offspring {
            if self.rng.chance(genetic.mutation_rate) {
                self.rng.mutate(&mut child.blend, pool_size, genetic, bounds);
                self.rng.repair(&mut child.blend, pool_size, bounds);
                child.evaluation = None;
            }
        }

        self.population = offspring;
        self.generation += 1;
    }

    /// Offer the population to the hall of fame and record generation statistics.
    fn record_generation(&mut self, evaluations: usize) -> GenerationStats {
        for candidate in &self.population {
            self.hall_of_fame.offer(&candidate.blend, candidate.fitness());
        }

        let stats = generation_stats(self.generation, evaluations, &self.population);

        if stats.best_fitness > self.best_fitness {
            self.best_fitness = stats.best_fitness;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        debug!(
            "Generation {}: best {:.4}, avg {:.4}, min diff {:.3}, hall of fame {}",
            stats.generation,
            stats.best_fitness,
            stats.avg_fitness,
            stats.min_flavor_diff,
            self.hall_of_fame.len()
        );

        self.history.push(stats.clone());
        stats
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.population.max_generations,
            best_fitness: self.best_fitness,
            current: self.history.last().cloned().unwrap_or_default(),
            stagnation_count: self.stagnation_count,
            archive_size: self.hall_of_fame.len(),
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> Result<EvolutionResult, SearchError>
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = Instant::now();
        info!(
            "Evolving {} blends over {} components for up to {} generations",
            self.config.population.size,
            self.evaluator.pool_size(),
            self.config.population.max_generations
        );

        self.initialize();
        let scored = self.evaluate_population()?;
        self.record_generation(scored);
        callback(&self.progress());

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.step_generation();
            let scored = self.evaluate_population()?;
            self.record_generation(scored);
            callback(&self.progress());
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        info!(
            "Search stopped after {} generations ({:?}): best fitness {:.4}, {} evaluations in {:.2}s",
            self.generation, stop_reason, self.best_fitness, self.evaluations, elapsed
        );

        Ok(EvolutionResult {
            hall_of_fame: self.hall_of_fame.ranked(),
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_fitness: self.best_fitness,
                elapsed_seconds: elapsed,
                evaluations_per_second: if elapsed > 0.0 {
                    self.evaluations as f64 / elapsed
                } else {
                    0.0
                },
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult, SearchError> {
        self.run_with_callback(|_| {})
    }
}

fn generation_stats(
    generation: usize,
    evaluations: usize,
    population: &[Candidate],
) -> GenerationStats {
    let evaluated: Vec<&Evaluation> = population
        .iter()
        .filter_map(|c| c.evaluation.as_ref())
        .collect();
    if evaluated.is_empty() {
        return GenerationStats {
            generation,
            evaluations,
            ..Default::default()
        };
    }

    let n = evaluated.len() as f64;
    let best_fitness = evaluated
        .iter()
        .map(|e| e.fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg_fitness = evaluated.iter().map(|e| e.fitness).sum::<f64>() / n;
    let variance = evaluated
        .iter()
        .map(|e| (e.fitness - avg_fitness).powi(2))
        .sum::<f64>()
        / n;

    let diffs: Vec<f64> = evaluated.iter().map(|e| e.total_deviation()).collect();
    let avg_flavor_diff = diffs.iter().sum::<f64>() / n;
    let min_flavor_diff = diffs.iter().copied().fold(f64::INFINITY, f64::min);

    GenerationStats {
        generation,
        evaluations,
        best_fitness,
        avg_fitness,
        fitness_std: variance.sqrt(),
        avg_flavor_diff,
        min_flavor_diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::WeightedMeanPredictor;
    use crate::schema::{Pool, PopulationConfig, TargetProfile};
    use std::sync::Mutex;

    fn pool() -> Pool {
        let flavors = vec![
            vec![5.0, 5.0, 5.0, 5.0],
            vec![7.0, 7.0, 7.0, 7.0],
            vec![6.0, 5.0, 7.0, 6.0],
            vec![4.0, 6.0, 6.0, 5.0],
            vec![8.0, 6.0, 5.0, 7.0],
            vec![6.5, 6.5, 6.0, 6.0],
        ];
        let ids = (0..flavors.len()).map(|i| format!("lot-{i}")).collect();
        Pool::from_parallel(ids, flavors, vec![2.0, 3.0, 2.5, 1.8, 4.0, 3.1]).unwrap()
    }

    fn target() -> TargetProfile {
        TargetProfile {
            flavor: vec![6.0; 4],
            color: 100.0,
        }
    }

    fn config(size: usize, generations: usize) -> SearchConfig {
        SearchConfig {
            population: PopulationConfig {
                size,
                max_generations: generations,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_evolution_engine_creation() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let mut engine = EvolutionEngine::new(config(10, 5), &evaluator).unwrap();
        engine.initialize();

        assert_eq!(engine.population().len(), 10);
        assert!(engine.population().iter().all(|c| c.blend.validate().is_ok()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let mut bad = config(10, 5);
        bad.population.size = 1;
        assert!(matches!(
            EvolutionEngine::new(bad, &evaluator),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn test_evolution_run() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let mut engine = EvolutionEngine::new(config(60, 8), &evaluator).unwrap();
        let result = engine.run().unwrap();

        assert_eq!(result.stats.generations, 8);
        assert_eq!(result.stats.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.history.len(), 9);
        assert_eq!(result.history[0].evaluations, 60);
        assert!(result.stats.total_evaluations >= 60);

        assert!(!result.hall_of_fame.is_empty());
        assert!(result.hall_of_fame.len() <= 20);
        for pair in result.hall_of_fame.windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
        for member in &result.hall_of_fame {
            assert!(member.blend.validate().is_ok());
        }
        // The hall of fame keeps the best blend ever seen.
        let best_seen = result
            .history
            .iter()
            .map(|h| h.best_fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.hall_of_fame[0].fitness, best_seen);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let a = EvolutionEngine::new(config(30, 4), &evaluator)
            .unwrap()
            .run()
            .unwrap();
        let b = EvolutionEngine::new(config(30, 4), &evaluator)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(a.hall_of_fame.len(), b.hall_of_fame.len());
        for (x, y) in a.hall_of_fame.iter().zip(&b.hall_of_fame) {
            assert_eq!(x.blend, y.blend);
            assert_eq!(x.fitness, y.fitness);
        }
    }

    #[test]
    fn test_callback_called_each_generation() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let seen = Mutex::new(Vec::new());
        let mut engine = EvolutionEngine::new(config(20, 3), &evaluator).unwrap();
        engine
            .run_with_callback(|p| seen.lock().unwrap().push(p.generation))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stagnation_limit() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let mut cfg = config(20, 500);
        cfg.population.stagnation_limit = Some(3);
        let result = EvolutionEngine::new(cfg, &evaluator).unwrap().run().unwrap();

        assert_eq!(result.stats.stop_reason, StopReason::Stagnation);
        assert!(result.stats.generations < 500);
    }

    #[test]
    fn test_cancellation() {
        let pool = pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        let mut engine = EvolutionEngine::new(config(10, 100), &evaluator).unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let result = engine.run().unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 0);
    }

    #[test]
    fn test_predictor_failure_aborts_run() {
        let pool = pool();
        let broken = |_: &[f64]| -> Result<Vec<f64>, crate::compute::PredictError> {
            Err(crate::compute::PredictError::Model("offline".into()))
        };
        let evaluator = Evaluator::new(&pool, &broken, target(), 0.0003).unwrap();

        let mut engine = EvolutionEngine::new(config(10, 3), &evaluator).unwrap();
        assert!(matches!(engine.run(), Err(SearchError::Prediction(_))));
    }
}
