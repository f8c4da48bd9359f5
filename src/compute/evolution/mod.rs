//! Evolutionary search for flavor-matching, low-cost blends.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genetic Operators** (`genome`): Random blends, two-point crossover,
//!   drop/add, jitter and substitution mutations, and the mandatory repair step
//! - **Search Engine** (`search`): Generational GA with tournament selection
//! - **Hall of Fame** (`archive`): Bounded archive of distinct good blends
//!
//! # Example
//!
//! ```rust,no_run
//! use blend_search::compute::evolution::EvolutionEngine;
//! use blend_search::compute::{Evaluator, WeightedMeanPredictor};
//! use blend_search::schema::{Pool, SearchConfig, TargetProfile};
//!
//! let pool = Pool::from_parallel(
//!     vec!["K-1".into(), "K-2".into()],
//!     vec![vec![5.0; 4], vec![7.0; 4]],
//!     vec![2.0, 3.0],
//! )?;
//! let predictor = WeightedMeanPredictor::new(pool.dimensions());
//! let target = TargetProfile { flavor: vec![6.0; 4], color: 100.0 };
//! let evaluator = Evaluator::new(&pool, &predictor, target, 0.0003)?;
//!
//! let mut engine = EvolutionEngine::new(SearchConfig::default(), &evaluator)?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         progress.generation, progress.best_fitness);
//! })?;
//!
//! println!("Hall of fame size: {}", result.hall_of_fame.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod archive;
mod genome;
mod search;

pub use archive::{Admission, HallOfFame, too_similar};
pub use genome::BlendRng;
pub use search::{Candidate, EvolutionEngine};
