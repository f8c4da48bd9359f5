//! Evolution configuration and progress types for the evolutionary blend search.

use serde::{Deserialize, Serialize};

use super::Blend;

/// Genetic algorithm operator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Probability that a pair of offspring is mated (two-point crossover).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Probability that an offspring is mutated.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Tournament size for selection.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    /// Probability of the component drop/add sub-mutation.
    #[serde(default = "default_sub_mutation_rate")]
    pub drop_add_rate: f64,
    /// Probability of the proportion jitter sub-mutation.
    #[serde(default = "default_sub_mutation_rate")]
    pub jitter_rate: f64,
    /// Probability of the component substitution sub-mutation.
    #[serde(default = "default_sub_mutation_rate")]
    pub substitute_rate: f64,
    /// Standard deviation of the Gaussian proportion jitter.
    #[serde(default = "default_jitter_sigma")]
    pub jitter_sigma: f64,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            tournament_size: default_tournament_size(),
            drop_add_rate: default_sub_mutation_rate(),
            jitter_rate: default_sub_mutation_rate(),
            substitute_rate: default_sub_mutation_rate(),
            jitter_sigma: default_jitter_sigma(),
        }
    }
}

fn default_crossover_rate() -> f64 {
    0.3
}
fn default_mutation_rate() -> f64 {
    0.6
}
fn default_tournament_size() -> usize {
    3
}
fn default_sub_mutation_rate() -> f64 {
    0.5
}
fn default_jitter_sigma() -> f64 {
    0.1
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Number of generations to run.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop if the best fitness has not improved for N generations.
    /// `None` always runs the full generation budget.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    1000
}
fn default_max_generations() -> usize {
    50
}

/// Hall-of-fame settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Maximum number of blends kept.
    #[serde(default = "default_archive_capacity")]
    pub capacity: usize,
    /// Mean absolute proportion difference below which two blends with the
    /// same component set count as the same suggestion.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            capacity: default_archive_capacity(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_archive_capacity() -> usize {
    20
}
fn default_similarity_threshold() -> f64 {
    0.05
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Statistics for one generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationStats {
    /// Generation number (0 = initial population).
    pub generation: usize,
    /// Individuals evaluated in this generation.
    pub evaluations: usize,
    /// Best fitness in the population.
    pub best_fitness: f64,
    /// Mean fitness of the population.
    pub avg_fitness: f64,
    /// Standard deviation of fitness.
    pub fitness_std: f64,
    /// Mean summed flavor deviation.
    pub avg_flavor_diff: f64,
    /// Smallest summed flavor deviation.
    pub min_flavor_diff: f64,
}

/// Progress update passed to callbacks after each generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Statistics for the current generation.
    pub current: GenerationStats,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Current hall-of-fame size.
    pub archive_size: usize,
}

/// Reason the search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Ran the full generation budget.
    MaxGenerations,
    /// Stagnation limit hit.
    Stagnation,
    /// Caller cancelled between generations.
    Cancelled,
    /// Exhaustive enumeration finished.
    Exhausted,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations run (0 for exhaustive search).
    pub generations: usize,
    /// Total blend evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// A blend paired with its fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredBlend {
    pub blend: Blend,
    pub fitness: f64,
}

/// Final result of an evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Hall of fame, sorted by fitness descending.
    pub hall_of_fame: Vec<ScoredBlend>,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Per-generation statistics.
    pub history: Vec<GenerationStats>,
}
