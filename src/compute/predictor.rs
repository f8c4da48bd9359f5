//! Flavor predictor interface and the fixed-width blend encoding it consumes.

use crate::schema::{Blend, MAX_COMPONENTS};

use super::SearchError;

/// Predicts the flavor of a blend from its encoded model input.
///
/// Implementations must be deterministic: the same input always yields the
/// same flavor vector. Failures are returned, never papered over.
pub trait FlavorPredictor: Send + Sync {
    /// Predict a flavor vector from an input built by [`encode_blend`].
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PredictError>;
}

impl<F> FlavorPredictor for F
where
    F: Fn(&[f64]) -> Result<Vec<f64>, PredictError> + Send + Sync,
{
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PredictError> {
        self(input)
    }
}

/// Width of the model input for `dimensions` flavor dimensions.
#[inline]
pub fn model_input_width(dimensions: usize) -> usize {
    (dimensions + 1) * MAX_COMPONENTS + 1
}

/// Flatten a blend into the model input layout.
///
/// Each active slot contributes its component's flavor followed by its
/// proportion. Unused slots are zero-filled and the roast color is appended
/// last.
pub fn encode_blend(
    blend: &Blend,
    flavors: &[Vec<f64>],
    color: f64,
) -> Result<Vec<f64>, SearchError> {
    let dimensions = flavors.first().map_or(0, Vec::len);
    let mut input = Vec::with_capacity(model_input_width(dimensions));

    for (component, proportion) in blend.active() {
        let flavor = flavors
            .get(component)
            .ok_or(SearchError::UnknownComponent {
                component,
                pool_size: flavors.len(),
            })?;
        input.extend_from_slice(flavor);
        input.push(proportion);
    }

    let padding = (dimensions + 1) * (MAX_COMPONENTS - blend.component_count());
    input.extend(std::iter::repeat_n(0.0, padding));
    input.push(color);

    Ok(input)
}

/// Reference predictor: the proportion-weighted mean of the component flavors.
///
/// A pure single-component blend predicts exactly that component's flavor.
/// Roast color is ignored.
#[derive(Debug, Clone, Copy)]
pub struct WeightedMeanPredictor {
    dimensions: usize,
}

impl WeightedMeanPredictor {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl FlavorPredictor for WeightedMeanPredictor {
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, PredictError> {
        let expected = model_input_width(self.dimensions);
        if input.len() != expected {
            return Err(PredictError::InputWidth {
                expected,
                found: input.len(),
            });
        }

        let mut flavor = vec![0.0; self.dimensions];
        let mut total = 0.0;
        for chunk in input[..input.len() - 1].chunks_exact(self.dimensions + 1) {
            let proportion = chunk[self.dimensions];
            for (acc, value) in flavor.iter_mut().zip(&chunk[..self.dimensions]) {
                *acc += value * proportion;
            }
            total += proportion;
        }

        if total <= 0.0 {
            return Err(PredictError::Model("blend has no active proportions".into()));
        }

        flavor.iter_mut().for_each(|v| *v /= total);
        Ok(flavor)
    }
}

/// Flavor prediction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("Model input has width {found}, expected {expected}")]
    InputWidth { expected: usize, found: usize },
    #[error("Model returned {found} flavor dimensions, expected {expected}")]
    OutputWidth { expected: usize, found: usize },
    #[error("Model failure: {0}")]
    Model(String),
}
