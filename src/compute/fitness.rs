//! Blend fitness: flavor deviation from the target traded against cost.

use rayon::prelude::*;

use crate::schema::{Blend, Pool, TargetProfile};

use super::SearchError;
use super::predictor::{FlavorPredictor, PredictError, encode_blend};

/// Min-max normalize prices to [0, 1]. A constant table maps to all zeros.
pub fn normalize_prices(prices: &[f64]) -> Vec<f64> {
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range > 0.0 {
        prices.iter().map(|p| (p - min) / range).collect()
    } else {
        vec![0.0; prices.len()]
    }
}

/// Proportion-weighted price of a blend.
///
/// Fails with [`SearchError::UnknownComponent`] if a slot points outside the table.
pub fn blend_cost(blend: &Blend, prices: &[f64]) -> Result<f64, SearchError> {
    blend
        .active()
        .map(|(component, p)| {
            prices
                .get(component)
                .map(|price| p * price)
                .ok_or(SearchError::UnknownComponent {
                    component,
                    pool_size: prices.len(),
                })
        })
        .sum()
}

/// Predict the flavor of a blend, checking the output shape.
pub fn predict_flavor(
    blend: &Blend,
    predictor: &dyn FlavorPredictor,
    flavors: &[Vec<f64>],
    dimensions: usize,
    color: f64,
) -> Result<Vec<f64>, SearchError> {
    let input = encode_blend(blend, flavors, color)?;
    let predicted = predictor.predict(&input)?;
    if predicted.len() != dimensions {
        return Err(PredictError::OutputWidth {
            expected: dimensions,
            found: predicted.len(),
        }
        .into());
    }
    Ok(predicted)
}

/// Absolute per-dimension deviation between the predicted flavor and `target`.
pub fn taste_diff(
    blend: &Blend,
    predictor: &dyn FlavorPredictor,
    flavors: &[Vec<f64>],
    target: &[f64],
    color: f64,
) -> Result<Vec<f64>, SearchError> {
    let predicted = predict_flavor(blend, predictor, flavors, target.len(), color)?;
    Ok(deviation(&predicted, target))
}

fn deviation(predicted: &[f64], target: &[f64]) -> Vec<f64> {
    predicted
        .iter()
        .zip(target)
        .map(|(p, t)| (t - p).abs())
        .collect()
}

/// `1 / 2^mean(diff^3)`: 1.0 for a perfect match, dominated by the worst dimension.
pub fn flavor_bound(diff: &[f64]) -> f64 {
    if diff.is_empty() {
        return 1.0;
    }
    let mean_cube = diff.iter().map(|d| d.powi(3)).sum::<f64>() / diff.len() as f64;
    1.0 / 2f64.powf(mean_cube)
}

/// Fitness of a blend; prices are normalized against the table passed in.
///
/// Prefer [`Evaluator`] inside a search so the normalization is computed once.
pub fn fitness(
    blend: &Blend,
    prices: &[f64],
    predictor: &dyn FlavorPredictor,
    flavors: &[Vec<f64>],
    target: &[f64],
    color: f64,
    cost_weight: f64,
) -> Result<f64, SearchError> {
    let normalized = normalize_prices(prices);
    let diff = taste_diff(blend, predictor, flavors, target, color)?;
    Ok(flavor_bound(&diff) - blend_cost(blend, &normalized)? * cost_weight)
}

/// Round a flavor value to the nearest quarter point.
#[inline]
pub fn round_to_quarter(value: f64) -> f64 {
    (value * 4.0).round() / 4.0
}

/// Full evaluation of one blend.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Combined fitness (higher is better).
    pub fitness: f64,
    /// Predicted flavor vector.
    pub predicted: Vec<f64>,
    /// Absolute per-dimension deviation from the target.
    pub taste_diff: Vec<f64>,
    /// Cost on the normalized price scale.
    pub normalized_cost: f64,
}

impl Evaluation {
    /// Largest per-dimension deviation.
    pub fn max_deviation(&self) -> f64 {
        self.taste_diff.iter().copied().fold(0.0, f64::max)
    }

    /// Summed deviation over all dimensions.
    pub fn total_deviation(&self) -> f64 {
        self.taste_diff.iter().sum()
    }

    /// Predicted flavor rounded to quarter points, as reported to tasters.
    pub fn predicted_flavor_rounded(&self) -> Vec<f64> {
        self.predicted.iter().copied().map(round_to_quarter).collect()
    }
}

/// Scores blends against one target with a fixed, pre-normalized price table.
pub struct Evaluator<'a> {
    flavors: Vec<Vec<f64>>,
    prices: Vec<f64>,
    normalized_prices: Vec<f64>,
    predictor: &'a dyn FlavorPredictor,
    target: TargetProfile,
    cost_weight: f64,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator for `pool`. The target must match the pool's flavor dimensions.
    pub fn new(
        pool: &Pool,
        predictor: &'a dyn FlavorPredictor,
        target: TargetProfile,
        cost_weight: f64,
    ) -> Result<Self, SearchError> {
        if target.flavor.len() != pool.dimensions() {
            return Err(SearchError::TargetDimensions {
                expected: pool.dimensions(),
                found: target.flavor.len(),
            });
        }

        let prices = pool.prices();
        let normalized_prices = normalize_prices(&prices);

        Ok(Self {
            flavors: pool.flavors(),
            prices,
            normalized_prices,
            predictor,
            target,
            cost_weight,
        })
    }

    /// Number of components in the pool.
    #[inline]
    pub fn pool_size(&self) -> usize {
        self.flavors.len()
    }

    /// Cost in the pool's raw price units.
    pub fn raw_cost(&self, blend: &Blend) -> Result<f64, SearchError> {
        blend_cost(blend, &self.prices)
    }

    /// Evaluate a single blend.
    pub fn evaluate(&self, blend: &Blend) -> Result<Evaluation, SearchError> {
        let predicted = predict_flavor(
            blend,
            self.predictor,
            &self.flavors,
            self.target.flavor.len(),
            self.target.color,
        )?;
        let taste_diff = deviation(&predicted, &self.target.flavor);
        let normalized_cost = blend_cost(blend, &self.normalized_prices)?;
        let fitness = flavor_bound(&taste_diff) - normalized_cost * self.cost_weight;

        Ok(Evaluation {
            fitness,
            predicted,
            taste_diff,
            normalized_cost,
        })
    }

    /// Evaluate many blends in parallel, preserving order.
    pub fn evaluate_batch(&self, blends: &[Blend]) -> Result<Vec<Evaluation>, SearchError> {
        blends.par_iter().map(|b| self.evaluate(b)).collect()
    }
}
