//! Blend requests and the ranked recommendations returned for them.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EvolutionStats, GenerationStats, Pool, PoolFilter, SearchConfig, TargetProfile};

/// Which search produces the candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Strategy {
    /// Evolutionary search over the whole pool.
    #[default]
    Evolutionary,
    /// Enumerate every blend containing `anchor` at or above `min_proportion` percent.
    Exhaustive { anchor: String, min_proportion: u32 },
    /// Exhaustive search repeated over random sub-pools of `sample_size` lots.
    Sampled {
        anchor: String,
        min_proportion: u32,
        sample_size: usize,
        runs: usize,
    },
}

/// A complete blend recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendRequest {
    /// Available lots.
    pub pool: Pool,
    /// Inventory constraints applied to the pool before searching.
    #[serde(default)]
    pub filter: PoolFilter,
    /// Flavor profile to match.
    pub target: TargetProfile,
    /// Search strategy.
    #[serde(default)]
    pub strategy: Strategy,
    /// Search parameters.
    #[serde(default)]
    pub config: SearchConfig,
}

impl BlendRequest {
    /// Load a request from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// One lot's share of a recommended blend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentShare {
    /// External lot id.
    pub id: String,
    /// Proportion (0.0-1.0).
    pub proportion: f64,
}

/// A ranked blend suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based rank.
    pub rank: usize,
    /// Fitness score (higher is better).
    pub fitness: f64,
    /// Blend cost in raw price units.
    pub cost: f64,
    /// Components and proportions.
    pub components: Vec<ComponentShare>,
    /// Predicted flavor rounded to quarter points.
    pub predicted_flavor: Vec<f64>,
    /// Absolute per-dimension deviation from the target.
    pub taste_diff: Vec<f64>,
}

/// Result of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    /// Ranked suggestions, best first.
    pub recommendations: Vec<Recommendation>,
    /// Run statistics.
    pub stats: EvolutionStats,
    /// Per-generation statistics (empty for exhaustive strategies).
    #[serde(default)]
    pub history: Vec<GenerationStats>,
    /// Number of lots left after filtering.
    pub pool_size: usize,
}
