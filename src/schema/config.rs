//! Configuration types for blend search parameters.

use serde::{Deserialize, Serialize};

use super::{ArchiveConfig, GeneticAlgorithmConfig, MAX_COMPONENTS, PopulationConfig};

/// Top-level search configuration, passed explicitly into every search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Structural limits on generated blends.
    #[serde(default)]
    pub bounds: BlendBounds,
    /// Genetic operator settings.
    #[serde(default)]
    pub genetic: GeneticAlgorithmConfig,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Hall-of-fame settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Exhaustive search settings.
    #[serde(default)]
    pub exhaustive: ExhaustiveConfig,
    /// Fitness penalty per unit of normalized cost.
    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_cost_weight() -> f64 {
    0.0003
}

/// Structural limits on blends produced by the evolutionary search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendBounds {
    /// Minimum number of components (MIN_C).
    #[serde(default = "default_min_components")]
    pub min_components: usize,
    /// Maximum number of components (MAX_C).
    #[serde(default = "default_max_components")]
    pub max_components: usize,
    /// Minimum proportion of an active component (MIN_P).
    #[serde(default = "default_min_proportion")]
    pub min_proportion: f64,
    /// Maximum proportion of an active component (MAX_P).
    #[serde(default = "default_max_proportion")]
    pub max_proportion: f64,
}

impl Default for BlendBounds {
    fn default() -> Self {
        Self {
            min_components: default_min_components(),
            max_components: default_max_components(),
            min_proportion: default_min_proportion(),
            max_proportion: default_max_proportion(),
        }
    }
}

fn default_min_components() -> usize {
    1
}
fn default_max_components() -> usize {
    MAX_COMPONENTS
}
fn default_min_proportion() -> f64 {
    0.06
}
fn default_max_proportion() -> f64 {
    1.0
}

/// Settings for exhaustive enumeration around an anchor component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhaustiveConfig {
    /// Smallest component count enumerated.
    #[serde(default = "default_exhaustive_min")]
    pub min_components: usize,
    /// Largest component count enumerated.
    #[serde(default = "default_exhaustive_max")]
    pub max_components: usize,
    /// Blends whose largest per-dimension flavor deviation exceeds this are discarded.
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    /// Keep only the N fittest blends (`None` keeps all survivors).
    #[serde(default = "default_top_n")]
    pub top_n: Option<usize>,
    /// Refuse searches that would enumerate more blends than this in total.
    #[serde(default = "default_max_blends")]
    pub max_blends: usize,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        Self {
            min_components: default_exhaustive_min(),
            max_components: default_exhaustive_max(),
            cutoff: default_cutoff(),
            top_n: default_top_n(),
            max_blends: default_max_blends(),
        }
    }
}

fn default_exhaustive_min() -> usize {
    2
}
fn default_exhaustive_max() -> usize {
    MAX_COMPONENTS
}
fn default_cutoff() -> f64 {
    0.5
}
fn default_top_n() -> Option<usize> {
    Some(50)
}
fn default_max_blends() -> usize {
    5_000_000
}

impl SearchConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bounds;
        if b.min_components == 0
            || b.min_components > b.max_components
            || b.max_components > MAX_COMPONENTS
        {
            return Err(ConfigError::InvalidComponentBounds {
                min: b.min_components,
                max: b.max_components,
            });
        }
        if !(b.min_proportion >= 0.01
            && b.min_proportion <= b.max_proportion
            && b.max_proportion <= 1.0)
        {
            return Err(ConfigError::InvalidProportionBounds {
                min: b.min_proportion,
                max: b.max_proportion,
            });
        }
        if b.min_proportion * b.max_components as f64 > 1.0 {
            return Err(ConfigError::InfeasibleFloor {
                min_proportion: b.min_proportion,
                max_components: b.max_components,
            });
        }

        if self.population.size < 2 {
            return Err(ConfigError::PopulationTooSmall);
        }
        if self.genetic.tournament_size == 0 {
            return Err(ConfigError::InvalidTournamentSize);
        }

        let g = &self.genetic;
        for (name, rate) in [
            ("crossover_rate", g.crossover_rate),
            ("mutation_rate", g.mutation_rate),
            ("drop_add_rate", g.drop_add_rate),
            ("jitter_rate", g.jitter_rate),
            ("substitute_rate", g.substitute_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidRate { name, value: rate });
            }
        }
        if !(g.jitter_sigma >= 0.0 && g.jitter_sigma.is_finite()) {
            return Err(ConfigError::InvalidRate {
                name: "jitter_sigma",
                value: g.jitter_sigma,
            });
        }

        if self.archive.capacity == 0 {
            return Err(ConfigError::EmptyArchive);
        }
        if !(self.archive.similarity_threshold > 0.0) {
            return Err(ConfigError::InvalidSimilarityThreshold(
                self.archive.similarity_threshold,
            ));
        }

        let e = &self.exhaustive;
        if e.min_components == 0
            || e.min_components > e.max_components
            || e.max_components > MAX_COMPONENTS
        {
            return Err(ConfigError::InvalidComponentBounds {
                min: e.min_components,
                max: e.max_components,
            });
        }
        if !(e.cutoff >= 0.0) {
            return Err(ConfigError::InvalidCutoff(e.cutoff));
        }
        if e.max_blends == 0 {
            return Err(ConfigError::InvalidBlendLimit);
        }

        if !(self.cost_weight >= 0.0 && self.cost_weight.is_finite()) {
            return Err(ConfigError::InvalidCostWeight(self.cost_weight));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Component count bounds [{min}, {max}] must satisfy 1 <= min <= max <= 7")]
    InvalidComponentBounds { min: usize, max: usize },
    #[error("Proportion bounds [{min}, {max}] must satisfy 0.01 <= min <= max <= 1")]
    InvalidProportionBounds { min: f64, max: f64 },
    #[error("Minimum proportion {min_proportion} cannot be met by {max_components} components")]
    InfeasibleFloor {
        min_proportion: f64,
        max_components: usize,
    },
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Tournament size must be positive")]
    InvalidTournamentSize,
    #[error("Invalid {name}: {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Hall-of-fame capacity must be positive")]
    EmptyArchive,
    #[error("Similarity threshold must be positive, got {0}")]
    InvalidSimilarityThreshold(f64),
    #[error("Flavor cutoff must be non-negative, got {0}")]
    InvalidCutoff(f64),
    #[error("Exhaustive blend limit must be positive")]
    InvalidBlendLimit,
    #[error("Cost weight must be finite and non-negative, got {0}")]
    InvalidCostWeight(f64),
}
