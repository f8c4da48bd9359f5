//! Compute module - Blend evaluation, enumeration and search.

mod enumerator;
mod exhaustive;
mod fitness;
mod predictor;
mod recommend;

pub mod evolution;

pub use enumerator::*;
pub use exhaustive::*;
pub use fitness::*;
pub use predictor::*;
pub use recommend::*;

use crate::schema::{ConfigError, PoolError};

/// Errors raised by a search run.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid pool: {0}")]
    Pool(#[from] PoolError),
    #[error("Flavor prediction failed: {0}")]
    Prediction(#[from] PredictError),
    #[error("Target has {found} flavor dimensions, pool has {expected}")]
    TargetDimensions { expected: usize, found: usize },
    #[error("Component {component} is outside the pool of {pool_size}")]
    UnknownComponent { component: usize, pool_size: usize },
    #[error("Anchor component '{0}' is not in the filtered pool")]
    UnknownAnchor(String),
    #[error(
        "Exhaustive search would enumerate {blends} blends (limit {limit}); use the sampled strategy or a smaller pool"
    )]
    SearchTooLarge { blends: usize, limit: usize },
}
