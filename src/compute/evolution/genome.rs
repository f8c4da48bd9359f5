//! Genetic operators on blends: random generation, crossover, mutation and repair.
//!
//! Operators may leave a blend temporarily invalid (duplicates, gaps,
//! proportions off the simplex). [`BlendRng::repair`] must run after every
//! operator before the blend is evaluated.

use rand::prelude::*;
use rand::seq::index;

use crate::schema::{Blend, BlendBounds, GeneticAlgorithmConfig, MAX_COMPONENTS, Slot};

/// Proportions are repaired on a grid of hundredths.
const GRID: i64 = 100;

/// Random number generator wrapper for blend operations.
pub struct BlendRng {
    rng: StdRng,
}

impl BlendRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, otherwise from entropy.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }

    /// Bernoulli trial.
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// `count` distinct indices from `0..n`, in random order.
    pub fn sample_indices(&mut self, n: usize, count: usize) -> Vec<usize> {
        index::sample(&mut self.rng, n, count.min(n)).into_vec()
    }

    /// Generate a random, repaired blend over a pool of `pool_size` components.
    ///
    /// Component count is uniform in the bounds. Proportions come from
    /// stick-breaking above the floor, then go through [`Self::repair`].
    pub fn random_blend(&mut self, pool_size: usize, bounds: &BlendBounds) -> Blend {
        let max_c = bounds.max_components.min(pool_size).max(1);
        let min_c = bounds.min_components.clamp(1, max_c);
        let count = self.rng.gen_range(min_c..=max_c);

        let components = self.sample_indices(pool_size, count);
        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        let mut used = 0.0;
        for (i, (slot, &component)) in slots.iter_mut().zip(&components).enumerate() {
            let remaining = (count - 1 - i) as f64;
            let proportion = if i + 1 == count {
                bounds.max_proportion - used
            } else {
                let upper = bounds.max_proportion - bounds.min_proportion * remaining - used;
                self.uniform(bounds.min_proportion, upper)
            };
            used += proportion;
            *slot = Slot::Active {
                component,
                proportion,
            };
        }

        let mut blend = Blend::from_slots_unchecked(slots);
        self.repair(&mut blend, pool_size, bounds);
        blend
    }

    /// Two-point crossover over the slot sequence, in place.
    ///
    /// Children need [`Self::repair`] afterwards: swapped segments can
    /// duplicate components or leave gaps.
    pub fn crossover(&mut self, a: &mut Blend, b: &mut Blend) {
        let size = MAX_COMPONENTS;
        let mut start = self.rng.gen_range(1..=size);
        let mut end = self.rng.gen_range(1..size);
        if end >= start {
            end += 1;
        } else {
            std::mem::swap(&mut start, &mut end);
        }
        let end = end.min(size);

        let (sa, sb) = (a.slots_mut(), b.slots_mut());
        sa[start..end].swap_with_slice(&mut sb[start..end]);
    }

    /// Apply each mutation sub-operator with its own probability.
    /// Returns true if any sub-operator fired.
    pub fn mutate(
        &mut self,
        blend: &mut Blend,
        pool_size: usize,
        genetic: &GeneticAlgorithmConfig,
        bounds: &BlendBounds,
    ) -> bool {
        let mut changed = false;
        if self.chance(genetic.drop_add_rate) {
            self.drop_add(blend, pool_size, bounds);
            changed = true;
        }
        if self.chance(genetic.jitter_rate) {
            self.jitter(blend, genetic.jitter_sigma);
            changed = true;
        }
        if self.chance(genetic.substitute_rate) {
            self.substitute(blend, pool_size);
            changed = true;
        }
        changed
    }

    /// Resample the component count, then drop random slots or add absent
    /// components with provisional proportions.
    pub fn drop_add(&mut self, blend: &mut Blend, pool_size: usize, bounds: &BlendBounds) {
        let mut active: Vec<Slot> = active_slots(blend);
        let max_c = bounds.max_components.min(pool_size).max(1);
        let target = self.rng.gen_range(bounds.min_components.clamp(1, max_c)..=max_c);

        if target < active.len() {
            let keep = self.sample_indices(active.len(), target);
            active = keep.into_iter().map(|i| active[i]).collect();
        } else {
            while active.len() < target {
                let present: Vec<usize> = active.iter().filter_map(Slot::component).collect();
                let Some(component) = self.absent_component(&present, pool_size) else {
                    break;
                };
                let proportion = self.uniform(bounds.min_proportion, bounds.max_proportion);
                active.push(Slot::Active {
                    component,
                    proportion,
                });
            }
        }

        *blend = Blend::from_slots_unchecked(pack(&active));
    }

    /// Add Gaussian noise to every active proportion.
    pub fn jitter(&mut self, blend: &mut Blend, sigma: f64) {
        for slot in blend.slots_mut().iter_mut() {
            if let Slot::Active { proportion, .. } = slot {
                let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
                *proportion += noise * sigma;
            }
        }
    }

    /// Replace a random subset of active components with components not
    /// already in the blend. Proportions stay with their slots.
    pub fn substitute(&mut self, blend: &mut Blend, pool_size: usize) {
        let positions: Vec<usize> = blend
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i)
            .collect();

        let count = self.rng.gen_range(0..=positions.len());
        if count == 0 {
            return;
        }

        let chosen: Vec<usize> = self
            .sample_indices(positions.len(), count)
            .into_iter()
            .map(|i| positions[i])
            .collect();

        let mut present: Vec<usize> = blend
            .slots()
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen.contains(i))
            .filter_map(|(_, s)| s.component())
            .collect();

        for position in chosen {
            let Some(replacement) = self.absent_component(&present, pool_size) else {
                // Keep the original component when nothing else is free.
                if let Some(c) = blend.slots()[position].component() {
                    present.push(c);
                }
                continue;
            };
            present.push(replacement);
            if let Slot::Active { component, .. } = &mut blend.slots_mut()[position] {
                *component = replacement;
            }
        }
    }

    /// Restore blend invariants after a genetic operator.
    ///
    /// Drops unknown and duplicate components (first occurrence wins), trims
    /// to the maximum count, injects random components up to the minimum
    /// count, clamps proportions to the bounds and rescales them on the 0.01
    /// grid so they sum to exactly 1.0. Rounding slack goes to the largest
    /// share, which may then exceed the upper bound.
    ///
    /// # Panics
    ///
    /// Panics if the repaired blend is still invalid.
    pub fn repair(&mut self, blend: &mut Blend, pool_size: usize, bounds: &BlendBounds) {
        let mut parts: Vec<(usize, f64)> = Vec::with_capacity(MAX_COMPONENTS);
        for (component, proportion) in blend.active() {
            if component < pool_size && parts.iter().all(|&(c, _)| c != component) {
                parts.push((component, proportion));
            }
        }

        let max_c = bounds.max_components.min(pool_size).max(1);
        let min_c = bounds.min_components.clamp(1, max_c);
        parts.truncate(max_c);
        while parts.len() < min_c {
            let present: Vec<usize> = parts.iter().map(|&(c, _)| c).collect();
            let Some(component) = self.absent_component(&present, pool_size) else {
                break;
            };
            let proportion = self.uniform(bounds.min_proportion, bounds.max_proportion);
            parts.push((component, proportion));
        }

        let hundredths = rescale(
            &parts.iter().map(|&(_, p)| p).collect::<Vec<_>>(),
            bounds,
        );

        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        for (slot, (&(component, _), h)) in slots.iter_mut().zip(parts.iter().zip(hundredths)) {
            *slot = Slot::Active {
                component,
                proportion: h as f64 / GRID as f64,
            };
        }
        *blend = Blend::from_slots_unchecked(slots);

        if let Err(e) = blend.validate() {
            panic!("blend repair produced an invalid blend ({e}): {blend:?}");
        }
    }

    /// Tournament selection: best of `size` draws (with replacement).
    pub fn select_tournament(&mut self, fitness: &[f64], size: usize) -> usize {
        let mut best = self.rng.gen_range(0..fitness.len());
        for _ in 1..size {
            let idx = self.rng.gen_range(0..fitness.len());
            if fitness[idx] > fitness[best] {
                best = idx;
            }
        }
        best
    }

    fn absent_component(&mut self, present: &[usize], pool_size: usize) -> Option<usize> {
        let free: Vec<usize> = (0..pool_size).filter(|c| !present.contains(c)).collect();
        free.choose(&mut self.rng).copied()
    }

    /// Uniform random in `[low, high]`, tolerating an empty range.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.gen_range(low..=high)
        } else {
            low
        }
    }
}

fn active_slots(blend: &Blend) -> Vec<Slot> {
    blend
        .slots()
        .iter()
        .copied()
        .filter(Slot::is_active)
        .collect()
}

fn pack(active: &[Slot]) -> [Slot; MAX_COMPONENTS] {
    let mut slots = [Slot::Empty; MAX_COMPONENTS];
    for (slot, a) in slots.iter_mut().zip(active) {
        *slot = *a;
    }
    slots
}

/// Clamp proportions to the bounds and rescale them into hundredths that sum
/// to [`GRID`], keeping every share at or above the floor.
fn rescale(proportions: &[f64], bounds: &BlendBounds) -> Vec<i64> {
    let n = proportions.len() as i64;
    if n == 0 {
        return Vec::new();
    }

    // The floor is relaxed to the grid when n shares of it would overflow.
    let min_h = ((bounds.min_proportion * GRID as f64 - 1e-6).ceil() as i64)
        .max(1)
        .min(GRID / n);
    let max_h = ((bounds.max_proportion * GRID as f64 + 1e-6).floor() as i64).max(min_h);

    let clamped: Vec<i64> = proportions
        .iter()
        .map(|&p| {
            let h = if p.is_finite() {
                (p * GRID as f64).round() as i64
            } else {
                min_h
            };
            h.clamp(min_h, max_h)
        })
        .collect();

    let free = GRID - min_h * n;
    let excess: i64 = clamped.iter().map(|h| h - min_h).sum();

    let mut shares: Vec<i64> = if excess == 0 {
        vec![min_h + free / n; clamped.len()]
    } else {
        clamped
            .iter()
            .map(|h| min_h + (h - min_h) * free / excess)
            .collect()
    };

    let slack = GRID - shares.iter().sum::<i64>();
    if let Some(largest) = shares
        .iter_mut()
        .enumerate()
        .max_by_key(|(i, h)| (**h, std::cmp::Reverse(*i)))
        .map(|(_, h)| h)
    {
        *largest += slack;
    }

    shares
}
