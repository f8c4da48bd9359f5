//! Exhaustive enumeration of blends around a required (anchor) component.
//!
//! Proportions live on a 5% grid. Every blend holds `k` components: the
//! anchor in the last active slot and `k - 1` other lots in front of it.

use std::fmt;

use log::warn;

use crate::schema::{Blend, MAX_COMPONENTS};

/// Proportion grid increment, in percent.
pub const PROPORTION_STEP: u32 = 5;

/// Clamp a requested anchor floor to [5, 95] on the 5% grid (round half up).
pub fn clamp_min_proportion(min_proportion: u32) -> u32 {
    let rounded = (min_proportion.saturating_add(PROPORTION_STEP / 2) / PROPORTION_STEP)
        * PROPORTION_STEP;
    rounded.clamp(PROPORTION_STEP, 100 - PROPORTION_STEP)
}

/// Why a request produces no blends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasible {
    /// `k` is zero or exceeds the blend arity.
    ComponentCount(usize),
    /// The anchor is not one of the available components.
    MissingAnchor(usize),
    /// More components requested than available.
    PoolTooSmall { k: usize, available: usize },
    /// The pool is too large for `k` to enumerate.
    PoolTooLarge { k: usize, available: usize },
}

impl fmt::Display for Infeasible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasible::ComponentCount(k) => {
                write!(f, "component count {k} outside 1..={MAX_COMPONENTS}")
            }
            Infeasible::MissingAnchor(c) => write!(f, "anchor {c} not in available components"),
            Infeasible::PoolTooSmall { k, available } => {
                write!(f, "{k} components requested from {available} available")
            }
            Infeasible::PoolTooLarge { k, available } => {
                write!(f, "{available} available components too many for k = {k}")
            }
        }
    }
}

/// Check whether a request can be enumerated at acceptable cost.
pub fn check_feasible(required: usize, available: &[usize], k: usize) -> Result<(), Infeasible> {
    let n = available.len();

    if k == 0 || k > MAX_COMPONENTS {
        return Err(Infeasible::ComponentCount(k));
    }
    if !available.contains(&required) {
        return Err(Infeasible::MissingAnchor(required));
    }
    if k > n {
        return Err(Infeasible::PoolTooSmall { k, available: n });
    }
    if (k > 6 && n > 8) || (k > 5 && n > 10) || (k > 4 && n > 15) {
        return Err(Infeasible::PoolTooLarge { k, available: n });
    }

    Ok(())
}

/// Enumerate every blend of `k` components containing `required` at or above
/// `min_proportion` percent.
///
/// Infeasible or oversized requests yield an empty list. The result is the
/// full cross product of component arrangements and proportion allocations,
/// so the same mix can appear under several slot orders.
pub fn enumerate(
    required: usize,
    min_proportion: u32,
    available: &[usize],
    k: usize,
) -> Vec<Blend> {
    blends(required, min_proportion, available, k).collect()
}

/// Lazy form of [`enumerate`]: yields the same blends in the same order
/// while holding only one component arrangement at a time.
pub fn blends(required: usize, min_proportion: u32, available: &[usize], k: usize) -> Blends {
    let available = dedup(available);
    if let Err(reason) = check_feasible(required, &available, k) {
        warn!("No blends enumerated: {reason}");
        return Blends::empty();
    }

    if k == 1 {
        return Blends {
            others: Vec::new(),
            allocations: vec![vec![100]],
            arrangement: Some(Vec::new()),
            components: vec![required],
            next_allocation: 0,
        };
    }

    let allocations = proportion_allocations(clamp_min_proportion(min_proportion), k);
    let others: Vec<usize> = available.into_iter().filter(|&c| c != required).collect();
    let arrangement: Option<Vec<usize>> = if allocations.is_empty() {
        None
    } else {
        Some((0..k - 1).collect())
    };

    let mut components: Vec<usize> = Vec::with_capacity(k);
    if let Some(first) = &arrangement {
        components.extend(first.iter().map(|&i: &usize| others[i]));
        components.push(required);
    }

    Blends {
        others,
        allocations,
        arrangement,
        components,
        next_allocation: 0,
    }
}

/// Iterator over enumerated blends, see [`blends`].
///
/// Walks component arrangements in lexicographic order and, for each one,
/// every proportion allocation.
#[derive(Debug, Clone)]
pub struct Blends {
    others: Vec<usize>,
    allocations: Vec<Vec<u32>>,
    /// Positions into `others` of the current arrangement, `None` when exhausted.
    arrangement: Option<Vec<usize>>,
    /// Current arrangement's components with the anchor last.
    components: Vec<usize>,
    next_allocation: usize,
}

impl Blends {
    fn empty() -> Self {
        Self {
            others: Vec::new(),
            allocations: Vec::new(),
            arrangement: None,
            components: Vec::new(),
            next_allocation: 0,
        }
    }

    /// Move to the next arrangement of distinct positions, lexicographically.
    fn advance_arrangement(&mut self) {
        let Some(positions) = self.arrangement.as_mut() else {
            return;
        };
        if !next_arrangement(positions, self.others.len()) {
            self.arrangement = None;
            return;
        }

        let anchor = self.components.last().copied();
        self.components.clear();
        self.components
            .extend(positions.iter().map(|&i| self.others[i]));
        self.components.extend(anchor);
        self.next_allocation = 0;
    }
}

impl Iterator for Blends {
    type Item = Blend;

    fn next(&mut self) -> Option<Blend> {
        loop {
            self.arrangement.as_ref()?;
            if let Some(percents) = self.allocations.get(self.next_allocation) {
                self.next_allocation += 1;
                return Some(Blend::from_percentages(&self.components, percents));
            }
            self.advance_arrangement();
        }
    }
}

/// Step `positions` (distinct values below `n`) to the next arrangement in
/// lexicographic order. Returns `false` after the last one.
fn next_arrangement(positions: &mut [usize], n: usize) -> bool {
    let r = positions.len();
    for i in (0..r).rev() {
        let prefix = &positions[..i];
        let bumped = (positions[i] + 1..n).find(|v| !prefix.contains(v));
        if let Some(value) = bumped {
            positions[i] = value;
            // Refill the tail with the smallest unused positions.
            let mut candidate = 0;
            for j in i + 1..r {
                while positions[..j].contains(&candidate) {
                    candidate += 1;
                }
                positions[j] = candidate;
                candidate += 1;
            }
            return true;
        }
    }
    false
}

/// Number of blends [`enumerate`] would return, without materializing them.
pub fn count_blends(required: usize, min_proportion: u32, available: &[usize], k: usize) -> usize {
    let available = dedup(available);
    if check_feasible(required, &available, k).is_err() {
        return 0;
    }
    if k == 1 {
        return 1;
    }

    let allocations = proportion_allocations(clamp_min_proportion(min_proportion), k).len();
    let others = available.len() - 1;
    let arrangements = (others + 2 - k..=others).fold(1usize, usize::saturating_mul);
    arrangements.saturating_mul(allocations)
}

/// Percentage tuples of length `k` on the 5% grid summing to 100, with the
/// anchor share last and at least `min_proportion`.
fn proportion_allocations(min_proportion: u32, k: usize) -> Vec<Vec<u32>> {
    let reserved = min_proportion + PROPORTION_STEP * (k as u32 - 2);
    if reserved >= 100 {
        return Vec::new();
    }
    let upper = 100 - reserved;
    let grid: Vec<u32> = (PROPORTION_STEP..=upper)
        .step_by(PROPORTION_STEP as usize)
        .collect();

    combinations_with_replacement(&grid, k - 1)
        .into_iter()
        .filter_map(|mut tuple| {
            let used: u32 = tuple.iter().sum();
            let anchor = 100u32.checked_sub(used)?;
            (anchor >= min_proportion).then(|| {
                tuple.push(anchor);
                tuple
            })
        })
        .collect()
}

/// Non-decreasing selections of `r` values (by position) from `values`.
fn combinations_with_replacement(values: &[u32], r: usize) -> Vec<Vec<u32>> {
    fn extend(values: &[u32], start: usize, r: usize, current: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if current.len() == r {
            out.push(current.clone());
            return;
        }
        for i in start..values.len() {
            current.push(values[i]);
            extend(values, i, r, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    extend(values, 0, r, &mut Vec::with_capacity(r), &mut out);
    out
}

fn dedup(available: &[usize]) -> Vec<usize> {
    let mut seen = Vec::with_capacity(available.len());
    for &c in available {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}
