//! Exhaustive search: enumerate every blend around an anchor component and
//! keep those whose predicted flavor stays within the cutoff on every dimension.

use std::collections::HashSet;

use log::{debug, info};

use crate::schema::{ArchiveConfig, Blend, ExhaustiveConfig, ScoredBlend};

use super::SearchError;
use super::enumerator::{blends, count_blends};
use super::evolution::{BlendRng, HallOfFame};
use super::fitness::Evaluator;

/// Blends scored per parallel batch.
const BATCH_SIZE: usize = 4096;

/// Blends that passed the flavor cutoff, with their fitness (parallel lists).
#[derive(Debug, Clone, Default)]
pub struct ExhaustiveResult {
    /// Surviving blends, concatenated across component counts.
    pub blends: Vec<Blend>,
    /// Fitness of each surviving blend.
    pub fitness: Vec<f64>,
    /// Number of blends enumerated and evaluated.
    pub evaluated: u64,
}

impl ExhaustiveResult {
    pub fn len(&self) -> usize {
        self.blends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blends.is_empty()
    }

    /// Survivors paired with fitness, best first. Slot-order permutations of
    /// the same mix are reported once.
    pub fn ranked(&self) -> Vec<ScoredBlend> {
        self.distinct(usize::MAX)
    }

    /// The `n` best distinct survivors.
    pub fn top_n(&self, n: usize) -> Vec<ScoredBlend> {
        self.distinct(n)
    }

    fn distinct(&self, limit: usize) -> Vec<ScoredBlend> {
        let mut order: Vec<usize> = (0..self.blends.len()).collect();
        order.sort_unstable_by(|&a, &b| {
            self.fitness[b]
                .total_cmp(&self.fitness[a])
                .then(a.cmp(&b))
        });

        let mut seen = HashSet::new();
        let mut ranked = Vec::new();
        for i in order {
            if ranked.len() >= limit {
                break;
            }
            if seen.insert(self.blends[i].content_key()) {
                ranked.push(ScoredBlend {
                    blend: self.blends[i],
                    fitness: self.fitness[i],
                });
            }
        }
        ranked
    }
}

/// Enumerate blends of every size in the configured range around `required`
/// and keep those whose largest flavor deviation is within the cutoff.
///
/// Blends are generated lazily and scored in parallel batches. Sizes the
/// enumerator refuses (pool too small or too large) contribute nothing.
/// Requests above `config.max_blends` in total are refused before any work;
/// predictor failures abort the search.
pub fn exhaustive_search(
    evaluator: &Evaluator<'_>,
    required: usize,
    min_proportion: u32,
    available: &[usize],
    config: &ExhaustiveConfig,
) -> Result<ExhaustiveResult, SearchError> {
    let sizes = config.min_components..=config.max_components;
    let total = sizes
        .clone()
        .map(|k| count_blends(required, min_proportion, available, k))
        .fold(0usize, usize::saturating_add);
    if total > config.max_blends {
        return Err(SearchError::SearchTooLarge {
            blends: total,
            limit: config.max_blends,
        });
    }

    let mut result = ExhaustiveResult::default();
    let mut batch = Vec::with_capacity(BATCH_SIZE.min(total));

    for k in sizes {
        if count_blends(required, min_proportion, available, k) == 0 {
            debug!("k = {k}: nothing to enumerate over {} components", available.len());
            continue;
        }

        let before = result.len();
        let mut enumerated = 0u64;
        let mut candidates = blends(required, min_proportion, available, k);
        loop {
            batch.clear();
            batch.extend(candidates.by_ref().take(BATCH_SIZE));
            if batch.is_empty() {
                break;
            }
            enumerated += batch.len() as u64;

            let evaluations = evaluator.evaluate_batch(&batch)?;
            for (blend, evaluation) in batch.iter().zip(evaluations) {
                if evaluation.max_deviation() <= config.cutoff {
                    result.blends.push(*blend);
                    result.fitness.push(evaluation.fitness);
                }
            }
        }
        result.evaluated += enumerated;

        debug!(
            "k = {k}: {enumerated} enumerated, {} within cutoff {}",
            result.len() - before,
            config.cutoff
        );
    }

    Ok(result)
}

/// Repeat [`exhaustive_search`] over `runs` random sub-pools of
/// `sample_size` components that always contain `required`, merging the
/// survivors through a hall of fame.
///
/// Used when the full pool is too large for the enumerator.
#[allow(clippy::too_many_arguments)]
pub fn sampled_exhaustive_search(
    evaluator: &Evaluator<'_>,
    required: usize,
    min_proportion: u32,
    sample_size: usize,
    runs: usize,
    config: &ExhaustiveConfig,
    archive: &ArchiveConfig,
    rng: &mut BlendRng,
) -> Result<(Vec<ScoredBlend>, u64), SearchError> {
    let pool_size = evaluator.pool_size();
    if required >= pool_size {
        return Err(SearchError::UnknownComponent {
            component: required,
            pool_size,
        });
    }

    let others: Vec<usize> = (0..pool_size).filter(|&c| c != required).collect();
    let draw = sample_size.saturating_sub(1).min(others.len());
    let mut hall_of_fame = HallOfFame::from_config(archive);
    let mut evaluated = 0;

    for run in 0..runs {
        let mut available: Vec<usize> = rng
            .sample_indices(others.len(), draw)
            .into_iter()
            .map(|i| others[i])
            .collect();
        available.push(required);
        available.sort_unstable();

        let result = exhaustive_search(evaluator, required, min_proportion, &available, config)?;
        evaluated += result.evaluated;
        let admitted =
            hall_of_fame.offer_all(result.blends.iter().zip(result.fitness.iter().copied()));

        debug!(
            "Run {}/{runs}: {} survivors, {admitted} admitted",
            run + 1,
            result.len()
        );
    }

    info!(
        "Sampled search: {runs} runs of {} components, {evaluated} blends evaluated, {} kept",
        draw + 1,
        hall_of_fame.len()
    );

    Ok((hall_of_fame.into_ranked(), evaluated))
}

/// Run [`exhaustive_search`] over the whole pool.
pub fn exhaustive_over_pool(
    evaluator: &Evaluator<'_>,
    required: usize,
    min_proportion: u32,
    config: &ExhaustiveConfig,
) -> Result<ExhaustiveResult, SearchError> {
    let available: Vec<usize> = (0..evaluator.pool_size()).collect();
    let result = exhaustive_search(evaluator, required, min_proportion, &available, config)?;
    info!(
        "Exhaustive search: {} blends evaluated, {} within cutoff",
        result.evaluated,
        result.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::WeightedMeanPredictor;
    use crate::schema::{Pool, Slot, TargetProfile};

    fn scenario_pool() -> Pool {
        Pool::from_parallel(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![5.0; 4], vec![7.0; 4], vec![6.0; 4]],
            vec![1.0; 3],
        )
        .unwrap()
    }

    fn target() -> TargetProfile {
        TargetProfile {
            flavor: vec![6.0; 4],
            color: 100.0,
        }
    }

    #[test]
    fn test_single_component_scenario() {
        let pool = scenario_pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 1,
            max_components: 1,
            ..Default::default()
        };

        let result = exhaustive_search(&evaluator, 2, 100, &[0, 1, 2], &config).unwrap();

        assert_eq!(result.len(), 1);
        let blend = result.blends[0];
        assert_eq!(blend.slots()[0], Slot::Active {
            component: 2,
            proportion: 1.0
        });
        assert!(blend.slots()[1..].iter().all(|s| *s == Slot::Empty));
        assert_eq!(evaluator.evaluate(&blend).unwrap().taste_diff, vec![0.0; 4]);
        assert_eq!(result.fitness[0], 1.0);
    }

    #[test]
    fn test_cutoff_filters_far_blends() {
        let pool = scenario_pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 2,
            max_components: 3,
            cutoff: 0.25,
            top_n: None,
            ..Default::default()
        };

        let result = exhaustive_search(&evaluator, 0, 5, &[0, 1, 2], &config).unwrap();
        assert!(!result.is_empty());
        assert_eq!(result.blends.len(), result.fitness.len());
        assert!(result.evaluated as usize > result.len());
        for blend in &result.blends {
            let evaluation = evaluator.evaluate(blend).unwrap();
            assert!(evaluation.max_deviation() <= 0.25);
            assert!(blend.proportion_of(0).is_some());
        }
    }

    #[test]
    fn test_ranked_dedupes_permutations() {
        let pool = scenario_pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 3,
            max_components: 3,
            cutoff: 10.0,
            top_n: None,
            ..Default::default()
        };

        let result = exhaustive_search(&evaluator, 2, 50, &[0, 1, 2], &config).unwrap();
        let ranked = result.ranked();
        assert!(ranked.len() < result.len());
        for (i, a) in ranked.iter().enumerate() {
            for b in &ranked[i + 1..] {
                assert!(!a.blend.same_content(&b.blend));
            }
        }
        for pair in ranked.windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
        assert_eq!(result.top_n(2).len(), 2);
    }

    fn lot_pool(size: usize) -> Pool {
        let flavors = (0..size)
            .map(|i| {
                let x = i as f64;
                vec![
                    5.0 + (x * 0.37) % 2.0,
                    5.5 + (x * 0.53) % 1.5,
                    6.0,
                    5.0 + (x * 0.29) % 2.0,
                ]
            })
            .collect();
        let ids = (0..size).map(|i| format!("lot-{i}")).collect();
        Pool::from_parallel(ids, flavors, (0..size).map(|i| 1.0 + i as f64 * 0.1).collect())
            .unwrap()
    }

    #[test]
    fn test_top_n_over_many_survivors() {
        let pool = lot_pool(10);
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 2,
            max_components: 4,
            cutoff: 10.0,
            ..Default::default()
        };

        let result = exhaustive_over_pool(&evaluator, 0, 5, &config).unwrap();
        assert!(result.len() > 100_000);
        assert_eq!(result.evaluated as usize, result.len());

        let top = result.top_n(50);
        let ranked = result.ranked();
        assert_eq!(top.len(), 50);
        assert_eq!(top[..], ranked[..50]);

        let keys: HashSet<_> = top.iter().map(|m| m.blend.content_key()).collect();
        assert_eq!(keys.len(), top.len());
        let best = result.fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(top[0].fitness, best);
    }

    #[test]
    fn test_oversized_request_is_refused() {
        let pool = lot_pool(50);
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 2,
            max_components: 4,
            ..Default::default()
        };

        let expected = (2..=4)
            .map(|k| count_blends(0, 5, &(0..50).collect::<Vec<_>>(), k))
            .sum::<usize>();
        match exhaustive_over_pool(&evaluator, 0, 5, &config) {
            Err(SearchError::SearchTooLarge { blends, limit }) => {
                assert_eq!(blends, expected);
                assert_eq!(limit, config.max_blends);
            }
            other => panic!("expected SearchTooLarge, got {other:?}"),
        }

        // Two-component blends over the same pool stay well inside the limit.
        let small = ExhaustiveConfig {
            max_components: 2,
            ..config
        };
        assert!(exhaustive_over_pool(&evaluator, 0, 5, &small).is_ok());
    }

    #[test]
    fn test_infeasible_sizes_are_skipped() {
        let pool = scenario_pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();

        // Only k = 2 and 3 fit into a three-component pool.
        let result = exhaustive_over_pool(&evaluator, 1, 20, &ExhaustiveConfig::default()).unwrap();
        assert!(result.blends.iter().all(|b| b.component_count() <= 3));
    }

    #[test]
    fn test_sampled_search_always_contains_anchor() {
        let flavors: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![4.0 + (i % 5) as f64, 5.0 + (i % 3) as f64, 6.0, 5.5])
            .collect();
        let ids = (0..20).map(|i| format!("lot-{i}")).collect();
        let pool = Pool::from_parallel(ids, flavors, (0..20).map(|i| 1.0 + i as f64).collect())
            .unwrap();
        let predictor = WeightedMeanPredictor::new(4);
        let target = TargetProfile {
            flavor: vec![6.0, 6.0, 6.0, 5.5],
            color: 100.0,
        };
        let evaluator = Evaluator::new(&pool, &predictor, target, 0.0003).unwrap();
        let config = ExhaustiveConfig {
            min_components: 2,
            max_components: 3,
            cutoff: 1.0,
            top_n: Some(10),
            ..Default::default()
        };

        let mut rng = BlendRng::new(11);
        let (ranked, evaluated) = sampled_exhaustive_search(
            &evaluator,
            7,
            30,
            6,
            3,
            &config,
            &ArchiveConfig::default(),
            &mut rng,
        )
        .unwrap();

        assert!(evaluated > 0);
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= ArchiveConfig::default().capacity);
        assert!(ranked.iter().all(|m| m.blend.proportion_of(7).is_some()));
    }

    #[test]
    fn test_sampled_search_unknown_anchor() {
        let pool = scenario_pool();
        let predictor = WeightedMeanPredictor::new(4);
        let evaluator = Evaluator::new(&pool, &predictor, target(), 0.0003).unwrap();
        let mut rng = BlendRng::new(1);

        assert!(matches!(
            sampled_exhaustive_search(
                &evaluator,
                5,
                10,
                3,
                1,
                &ExhaustiveConfig::default(),
                &ArchiveConfig::default(),
                &mut rng,
            ),
            Err(SearchError::UnknownComponent { component: 5, .. })
        ));
    }
}
