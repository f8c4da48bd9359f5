//! Blend value type: fixed-arity component/proportion slots.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Maximum number of components in a blend (fixed arity of every blend).
pub const MAX_COMPONENTS: usize = 7;

/// Allowed deviation of the proportion sum from 1.0.
pub const PROPORTION_TOLERANCE: f64 = 1e-6;

/// A single position in a blend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "slot")]
pub enum Slot {
    /// A component index into the pool with its mixing proportion.
    Active { component: usize, proportion: f64 },
    /// Unused position.
    #[default]
    Empty,
}

impl Slot {
    /// Component index if the slot is active.
    #[inline]
    pub fn component(&self) -> Option<usize> {
        match self {
            Slot::Active { component, .. } => Some(*component),
            Slot::Empty => None,
        }
    }

    /// Proportion of the slot (0.0 when empty).
    #[inline]
    pub fn proportion(&self) -> f64 {
        match self {
            Slot::Active { proportion, .. } => *proportion,
            Slot::Empty => 0.0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Slot::Active { .. })
    }
}

/// A coffee blend: up to [`MAX_COMPONENTS`] components with proportions summing to 1.0.
///
/// Active slots are packed at the front; the rest are [`Slot::Empty`].
/// Equality via [`Blend::same_content`] ignores slot order. Deserialized
/// blends are validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[Slot; MAX_COMPONENTS]", into = "[Slot; MAX_COMPONENTS]")]
pub struct Blend {
    slots: [Slot; MAX_COMPONENTS],
}

impl Blend {
    /// Build a validated blend from (component, proportion) pairs.
    pub fn new(parts: &[(usize, f64)]) -> Result<Self, BlendError> {
        if parts.len() > MAX_COMPONENTS {
            return Err(BlendError::TooManyComponents(parts.len()));
        }

        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        for (slot, &(component, proportion)) in slots.iter_mut().zip(parts) {
            *slot = Slot::Active {
                component,
                proportion,
            };
        }

        let blend = Self { slots };
        blend.validate()?;
        Ok(blend)
    }

    /// Blend made of a single component at 100%.
    pub fn pure(component: usize) -> Self {
        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        slots[0] = Slot::Active {
            component,
            proportion: 1.0,
        };
        Self { slots }
    }

    /// Build a blend from integer percentages. Callers guarantee the percentages sum to 100.
    pub(crate) fn from_percentages(components: &[usize], percents: &[u32]) -> Self {
        debug_assert_eq!(components.len(), percents.len());
        debug_assert_eq!(percents.iter().sum::<u32>(), 100);

        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        for (slot, (&component, &pct)) in slots.iter_mut().zip(components.iter().zip(percents)) {
            *slot = Slot::Active {
                component,
                proportion: f64::from(pct) / 100.0,
            };
        }
        Self { slots }
    }

    /// Wrap raw slots without validation. Used by genetic operators before repair.
    pub(crate) fn from_slots_unchecked(slots: [Slot; MAX_COMPONENTS]) -> Self {
        Self { slots }
    }

    /// All slots, including empty ones.
    #[inline]
    pub fn slots(&self) -> &[Slot; MAX_COMPONENTS] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot; MAX_COMPONENTS] {
        &mut self.slots
    }

    /// Iterate active (component, proportion) pairs in slot order.
    pub fn active(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Active {
                component,
                proportion,
            } => Some((*component, *proportion)),
            Slot::Empty => None,
        })
    }

    /// Number of active components.
    pub fn component_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Set of active component indices.
    pub fn component_set(&self) -> BTreeSet<usize> {
        self.active().map(|(c, _)| c).collect()
    }

    /// Proportion assigned to `component`, if present.
    pub fn proportion_of(&self, component: usize) -> Option<f64> {
        self.active()
            .find(|&(c, _)| c == component)
            .map(|(_, p)| p)
    }

    /// Sum of all active proportions.
    pub fn total_proportion(&self) -> f64 {
        self.active().map(|(_, p)| p).sum()
    }

    /// Check the blend invariants.
    pub fn validate(&self) -> Result<(), BlendError> {
        let mut seen_empty = false;
        let mut seen = BTreeSet::new();

        for slot in &self.slots {
            match slot {
                Slot::Empty => seen_empty = true,
                Slot::Active {
                    component,
                    proportion,
                } => {
                    if seen_empty {
                        return Err(BlendError::NotPacked);
                    }
                    if !seen.insert(*component) {
                        return Err(BlendError::DuplicateComponent(*component));
                    }
                    if !proportion.is_finite() || *proportion <= 0.0 || *proportion > 1.0 {
                        return Err(BlendError::InvalidProportion {
                            component: *component,
                            proportion: *proportion,
                        });
                    }
                }
            }
        }

        if seen.is_empty() {
            return Err(BlendError::Empty);
        }

        let total = self.total_proportion();
        if (total - 1.0).abs() > PROPORTION_TOLERANCE {
            return Err(BlendError::ProportionSum(total));
        }

        Ok(())
    }

    /// True if both blends hold the same (component, proportion) pairs, in any slot order.
    pub fn same_content(&self, other: &Blend) -> bool {
        self.component_count() == other.component_count()
            && self.active().all(|(c, p)| {
                other
                    .proportion_of(c)
                    .is_some_and(|q| (p - q).abs() <= PROPORTION_TOLERANCE)
            })
    }

    /// Hashable identity of the blend's content, independent of slot order.
    ///
    /// Pairs are sorted by component with proportions in basis points; unused
    /// entries are `(usize::MAX, 0)` and sort last.
    pub fn content_key(&self) -> [(usize, u32); MAX_COMPONENTS] {
        let mut key = [(usize::MAX, 0); MAX_COMPONENTS];
        for (entry, (component, proportion)) in key.iter_mut().zip(self.active()) {
            *entry = (component, (proportion * 10_000.0).round() as u32);
        }
        key.sort_unstable();
        key
    }
}

impl TryFrom<[Slot; MAX_COMPONENTS]> for Blend {
    type Error = BlendError;

    fn try_from(slots: [Slot; MAX_COMPONENTS]) -> Result<Self, Self::Error> {
        let blend = Self { slots };
        blend.validate()?;
        Ok(blend)
    }
}

impl From<Blend> for [Slot; MAX_COMPONENTS] {
    fn from(blend: Blend) -> Self {
        blend.slots
    }
}

/// Blend validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlendError {
    #[error("Blend has {0} components, at most {MAX_COMPONENTS} allowed")]
    TooManyComponents(usize),
    #[error("Blend has no active components")]
    Empty,
    #[error("Component {0} appears more than once")]
    DuplicateComponent(usize),
    #[error("Component {component} has invalid proportion {proportion}")]
    InvalidProportion { component: usize, proportion: f64 },
    #[error("Proportions sum to {0}, expected 1.0")]
    ProportionSum(f64),
    #[error("Active slots must precede empty slots")]
    NotPacked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_blend() {
        let blend = Blend::new(&[(3, 0.5), (1, 0.3), (7, 0.2)]).unwrap();
        assert_eq!(blend.component_count(), 3);
        assert_eq!(blend.slots()[3], Slot::Empty);
        assert!((blend.total_proportion() - 1.0).abs() < PROPORTION_TOLERANCE);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = Blend::new(&[(1, 0.5), (1, 0.5)]).unwrap_err();
        assert_eq!(err, BlendError::DuplicateComponent(1));
    }

    #[test]
    fn test_rejects_bad_sum() {
        assert!(matches!(
            Blend::new(&[(1, 0.5), (2, 0.4)]),
            Err(BlendError::ProportionSum(_))
        ));
        assert_eq!(Blend::new(&[]).unwrap_err(), BlendError::Empty);
    }

    #[test]
    fn test_rejects_too_many() {
        let parts: Vec<(usize, f64)> = (0..8).map(|i| (i, 0.125)).collect();
        assert_eq!(
            Blend::new(&parts).unwrap_err(),
            BlendError::TooManyComponents(8)
        );
    }

    #[test]
    fn test_pure_blend() {
        let blend = Blend::pure(2);
        assert!(blend.validate().is_ok());
        assert_eq!(blend.active().collect::<Vec<_>>(), vec![(2, 1.0)]);
        assert!(blend.slots()[1..].iter().all(|s| *s == Slot::Empty));
    }

    #[test]
    fn test_same_content_ignores_order() {
        let a = Blend::new(&[(0, 0.6), (4, 0.4)]).unwrap();
        let b = Blend::new(&[(4, 0.4), (0, 0.6)]).unwrap();
        let c = Blend::new(&[(4, 0.6), (0, 0.4)]).unwrap();
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
        assert_eq!(a.content_key(), b.content_key());
        assert_ne!(a.content_key(), c.content_key());
    }

    #[test]
    fn test_serde_validates() {
        let blend = Blend::new(&[(3, 0.75), (1, 0.25)]).unwrap();
        let json = serde_json::to_string(&blend).unwrap();
        let parsed: Blend = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, blend);

        let empty = r#"{"slot": "Empty"}"#;
        let active = |c: usize, p: f64| format!(r#"{{"slot": "Active", "component": {c}, "proportion": {p}}}"#);

        // Proportions sum to 0.9.
        let short = format!(
            "[{}, {}, {empty}, {empty}, {empty}, {empty}, {empty}]",
            active(0, 0.5),
            active(1, 0.4)
        );
        assert!(serde_json::from_str::<Blend>(&short).is_err());

        // Same component twice.
        let duplicated = format!(
            "[{}, {}, {empty}, {empty}, {empty}, {empty}, {empty}]",
            active(2, 0.5),
            active(2, 0.5)
        );
        assert!(serde_json::from_str::<Blend>(&duplicated).is_err());

        // Active slot after an empty one.
        let unpacked = format!(
            "[{empty}, {}, {empty}, {empty}, {empty}, {empty}, {empty}]",
            active(0, 1.0)
        );
        assert!(serde_json::from_str::<Blend>(&unpacked).is_err());
    }

    #[test]
    fn test_from_percentages() {
        let blend = Blend::from_percentages(&[5, 2], &[35, 65]);
        assert!(blend.validate().is_ok());
        assert_eq!(blend.proportion_of(2), Some(0.65));
    }

    #[test]
    fn test_not_packed_rejected() {
        let mut slots = [Slot::Empty; MAX_COMPONENTS];
        slots[1] = Slot::Active {
            component: 0,
            proportion: 1.0,
        };
        let blend = Blend::from_slots_unchecked(slots);
        assert_eq!(blend.validate().unwrap_err(), BlendError::NotPacked);
    }
}
