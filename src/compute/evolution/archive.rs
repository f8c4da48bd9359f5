//! Hall of fame: a bounded archive of good, mutually distinct blends.

use crate::schema::{ArchiveConfig, Blend, ScoredBlend};

/// True when both blends use the same set of components and their matched
/// proportions differ by less than `threshold` on average.
///
/// Blends with different component sets are never similar.
pub fn too_similar(a: &Blend, b: &Blend, threshold: f64) -> bool {
    if a.component_set() != b.component_set() {
        return false;
    }

    let count = a.component_count();
    if count == 0 {
        return true;
    }

    // Sum in component order so the result does not depend on argument order.
    let total: f64 = a
        .component_set()
        .into_iter()
        .map(|c| {
            let p = a.proportion_of(c).unwrap_or(0.0);
            let q = b.proportion_of(c).unwrap_or(0.0);
            (p - q).abs()
        })
        .sum();

    // Identical blends are always similar, even at a zero threshold.
    total == 0.0 || total / (count as f64) < threshold
}

/// Outcome of offering a candidate to the hall of fame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added without eviction.
    Inserted,
    /// Replaced the member at this index.
    Replaced(usize),
    /// Not admitted.
    Rejected,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

/// Bounded, diversity-preserving archive of scored blends.
#[derive(Debug, Clone)]
pub struct HallOfFame {
    members: Vec<ScoredBlend>,
    capacity: usize,
    similarity_threshold: f64,
}

impl HallOfFame {
    /// Create an empty hall of fame.
    pub fn new(capacity: usize, similarity_threshold: f64) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
            capacity,
            similarity_threshold,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.capacity, config.similarity_threshold)
    }

    /// Offer a candidate.
    ///
    /// A candidate similar to no member fills free capacity or displaces the
    /// globally weakest member. A candidate similar to existing members can
    /// only displace the weakest of those. Ties never displace.
    pub fn offer(&mut self, blend: &Blend, fitness: f64) -> Admission {
        if self.members.is_empty() {
            self.members.push(ScoredBlend {
                blend: *blend,
                fitness,
            });
            return Admission::Inserted;
        }

        let threshold = self.similarity_threshold;
        let weakest_similar = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| too_similar(blend, &m.blend, threshold))
            .min_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(i, _)| i);

        let victim = match weakest_similar {
            Some(i) => i,
            None if self.members.len() < self.capacity => {
                self.members.push(ScoredBlend {
                    blend: *blend,
                    fitness,
                });
                return Admission::Inserted;
            }
            None => match self.weakest() {
                Some(i) => i,
                None => return Admission::Rejected,
            },
        };

        if fitness > self.members[victim].fitness {
            self.members[victim] = ScoredBlend {
                blend: *blend,
                fitness,
            };
            Admission::Replaced(victim)
        } else {
            Admission::Rejected
        }
    }

    /// Offer candidates one at a time in order. Returns how many were admitted.
    pub fn offer_all<'b, I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = (&'b Blend, f64)>,
    {
        candidates
            .into_iter()
            .filter(|(blend, fitness)| self.offer(blend, *fitness).is_admitted())
            .count()
    }

    fn weakest(&self) -> Option<usize> {
        self.members
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(i, _)| i)
    }

    /// Best fitness currently held.
    pub fn best_fitness(&self) -> Option<f64> {
        self.members.iter().map(|m| m.fitness).max_by(f64::total_cmp)
    }

    /// Members in insertion/replacement order.
    pub fn members(&self) -> &[ScoredBlend] {
        &self.members
    }

    /// Members sorted by fitness, best first.
    pub fn ranked(&self) -> Vec<ScoredBlend> {
        let mut ranked = self.members.clone();
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        ranked
    }

    /// Consume the archive, returning members best first.
    pub fn into_ranked(mut self) -> Vec<ScoredBlend> {
        self.members.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
