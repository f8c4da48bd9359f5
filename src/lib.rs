//! Blend Search - Flavor-matching, cost-minimizing coffee blend recommendation.
//!
//! Given a pool of coffee lots with sensory flavor profiles and prices, this
//! crate searches for blends (up to seven lots with proportions summing to
//! 100%) whose predicted flavor matches a target profile at the lowest cost.
//! Flavor prediction is delegated to a pluggable [`compute::FlavorPredictor`].
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Blends, pools, search configuration, requests and reports
//! - `compute`: Fitness evaluation, candidate enumeration, exhaustive and
//!   evolutionary search, request orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use blend_search::{
//!     compute::{WeightedMeanPredictor, recommend},
//!     schema::BlendRequest,
//! };
//!
//! let request = BlendRequest::from_json_file("request.json")?;
//! let predictor = WeightedMeanPredictor::new(request.pool.dimensions());
//!
//! let report = recommend(&request, &predictor)?;
//! for rec in &report.recommendations {
//!     println!("#{} fitness {:.4} cost {:.2}", rec.rank, rec.fitness, rec.cost);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Evaluator, FlavorPredictor, SearchError, recommend};
pub use schema::{Blend, BlendRequest, Pool, RecommendationReport, SearchConfig, Slot};
