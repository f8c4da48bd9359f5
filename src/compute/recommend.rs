//! Request orchestration: filter the pool, run the chosen search and rank
//! the results as presentable recommendations.

use std::time::Instant;

use log::info;

use crate::schema::{
    BlendRequest, ComponentShare, EvolutionStats, Pool, Recommendation, RecommendationReport,
    ScoredBlend, StopReason, Strategy,
};

use super::SearchError;
use super::evolution::{BlendRng, EvolutionEngine};
use super::exhaustive::{exhaustive_over_pool, sampled_exhaustive_search};
use super::fitness::Evaluator;
use super::predictor::FlavorPredictor;

/// Answer a blend request with ranked recommendations.
///
/// The configuration is validated and the pool filtered before any blend is
/// evaluated. Anchors are resolved by component id within the filtered pool.
pub fn recommend(
    request: &BlendRequest,
    predictor: &dyn FlavorPredictor,
) -> Result<RecommendationReport, SearchError> {
    let config = &request.config;
    config.validate()?;

    let pool = request.pool.filtered(&request.filter)?;
    info!(
        "Recommending blends from {} of {} components",
        pool.len(),
        request.pool.len()
    );

    let evaluator = Evaluator::new(&pool, predictor, request.target.clone(), config.cost_weight)?;
    let start_time = Instant::now();

    let (ranked, stats, history) = match &request.strategy {
        Strategy::Evolutionary => {
            let mut engine = EvolutionEngine::new(config.clone(), &evaluator)?;
            let result = engine.run()?;
            (result.hall_of_fame, result.stats, result.history)
        }
        Strategy::Exhaustive {
            anchor,
            min_proportion,
        } => {
            let required = resolve_anchor(&pool, anchor)?;
            let result =
                exhaustive_over_pool(&evaluator, required, *min_proportion, &config.exhaustive)?;
            let ranked = match config.exhaustive.top_n {
                Some(n) => result.top_n(n),
                None => result.ranked(),
            };
            let stats = exhaustive_stats(&ranked, result.evaluated, start_time);
            (ranked, stats, Vec::new())
        }
        Strategy::Sampled {
            anchor,
            min_proportion,
            sample_size,
            runs,
        } => {
            let required = resolve_anchor(&pool, anchor)?;
            let mut rng = BlendRng::from_seed_option(config.random_seed);
            let (mut ranked, evaluated) = sampled_exhaustive_search(
                &evaluator,
                required,
                *min_proportion,
                *sample_size,
                *runs,
                &config.exhaustive,
                &config.archive,
                &mut rng,
            )?;
            if let Some(n) = config.exhaustive.top_n {
                ranked.truncate(n);
            }
            let stats = exhaustive_stats(&ranked, evaluated, start_time);
            (ranked, stats, Vec::new())
        }
    };

    let recommendations = ranked
        .iter()
        .enumerate()
        .map(|(i, scored)| recommendation(i + 1, scored, &evaluator, &pool))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "{} recommendations, best fitness {:.4}",
        recommendations.len(),
        stats.best_fitness
    );

    Ok(RecommendationReport {
        recommendations,
        stats,
        history,
        pool_size: pool.len(),
    })
}

fn resolve_anchor(pool: &Pool, anchor: &str) -> Result<usize, SearchError> {
    pool.index_of(anchor)
        .ok_or_else(|| SearchError::UnknownAnchor(anchor.to_string()))
}

fn exhaustive_stats(ranked: &[ScoredBlend], evaluated: u64, start_time: Instant) -> EvolutionStats {
    let elapsed = start_time.elapsed().as_secs_f64();
    EvolutionStats {
        generations: 0,
        total_evaluations: evaluated,
        best_fitness: ranked.first().map_or(f64::NEG_INFINITY, |m| m.fitness),
        elapsed_seconds: elapsed,
        evaluations_per_second: if elapsed > 0.0 {
            evaluated as f64 / elapsed
        } else {
            0.0
        },
        stop_reason: StopReason::Exhausted,
    }
}

fn recommendation(
    rank: usize,
    scored: &ScoredBlend,
    evaluator: &Evaluator<'_>,
    pool: &Pool,
) -> Result<Recommendation, SearchError> {
    let evaluation = evaluator.evaluate(&scored.blend)?;
    let components = scored
        .blend
        .active()
        .map(|(component, proportion)| {
            pool.get(component)
                .map(|c| ComponentShare {
                    id: c.id.clone(),
                    proportion,
                })
                .ok_or(SearchError::UnknownComponent {
                    component,
                    pool_size: pool.len(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Recommendation {
        rank,
        fitness: scored.fitness,
        cost: evaluator.raw_cost(&scored.blend)?,
        components,
        predicted_flavor: evaluation.predicted_flavor_rounded(),
        taste_diff: evaluation.taste_diff,
    })
}
