//! Candidate pool: the coffee lots available to one optimization run.

use serde::{Deserialize, Serialize};

/// Smallest supported flavor vector (acidity, body, aroma, aftertaste).
pub const MIN_FLAVOR_DIMENSIONS: usize = 4;
/// Largest supported flavor vector (adds robusta character).
pub const MAX_FLAVOR_DIMENSIONS: usize = 5;

/// An available coffee lot/contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// External identifier (contract number).
    pub id: String,
    /// Graded flavor vector.
    pub flavor: Vec<f64>,
    /// Unit price on an arbitrary scale.
    pub price: f64,
    /// Available quantity (kg).
    #[serde(default)]
    pub quantity: f64,
    /// Storage location, e.g. `"WAREHOUSE"` or `"SPOT"`.
    #[serde(default)]
    pub location: Option<String>,
    /// Certifications carried by the lot (e.g. `"Fairtrade"`, `"Organic"`).
    /// An empty list means a conventional lot.
    #[serde(default)]
    pub certifications: Vec<String>,
}

/// Dense, immutable list of components. A component's index is its position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Component>", into = "Vec<Component>")]
pub struct Pool {
    components: Vec<Component>,
    dimensions: usize,
}

impl Pool {
    /// Build a pool, checking that every flavor vector has the same supported shape.
    pub fn new(components: Vec<Component>) -> Result<Self, PoolError> {
        let first = components.first().ok_or(PoolError::Empty)?;
        let dimensions = first.flavor.len();
        if !(MIN_FLAVOR_DIMENSIONS..=MAX_FLAVOR_DIMENSIONS).contains(&dimensions) {
            return Err(PoolError::UnsupportedDimensions(dimensions));
        }

        for (index, component) in components.iter().enumerate() {
            if component.flavor.len() != dimensions {
                return Err(PoolError::DimensionMismatch {
                    index,
                    expected: dimensions,
                    found: component.flavor.len(),
                });
            }
            if !component.price.is_finite() || component.flavor.iter().any(|v| !v.is_finite()) {
                return Err(PoolError::NonFinite { index });
            }
        }

        Ok(Self {
            components,
            dimensions,
        })
    }

    /// Build a pool from parallel id/flavor/price arrays.
    pub fn from_parallel(
        ids: Vec<String>,
        flavors: Vec<Vec<f64>>,
        prices: Vec<f64>,
    ) -> Result<Self, PoolError> {
        if ids.len() != flavors.len() || ids.len() != prices.len() {
            return Err(PoolError::LengthMismatch {
                ids: ids.len(),
                flavors: flavors.len(),
                prices: prices.len(),
            });
        }

        let components = ids
            .into_iter()
            .zip(flavors)
            .zip(prices)
            .map(|((id, flavor), price)| Component {
                id,
                flavor,
                price,
                quantity: 0.0,
                location: None,
                certifications: Vec::new(),
            })
            .collect();

        Self::new(components)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of flavor dimensions shared by all components.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn get(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Flavor table, one row per component.
    pub fn flavors(&self) -> Vec<Vec<f64>> {
        self.components.iter().map(|c| c.flavor.clone()).collect()
    }

    /// Price table, one entry per component.
    pub fn prices(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.price).collect()
    }

    /// Index of the component with the given external id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    /// New pool holding only the components accepted by `filter` (indices are re-densified).
    pub fn filtered(&self, filter: &PoolFilter) -> Result<Pool, PoolError> {
        let kept: Vec<Component> = self
            .components
            .iter()
            .filter(|c| filter.accepts(c))
            .cloned()
            .collect();

        if kept.is_empty() {
            return Err(PoolError::EmptyAfterFilter);
        }

        Ok(Pool {
            components: kept,
            dimensions: self.dimensions,
        })
    }
}

impl TryFrom<Vec<Component>> for Pool {
    type Error = PoolError;

    fn try_from(components: Vec<Component>) -> Result<Self, Self::Error> {
        Pool::new(components)
    }
}

impl From<Pool> for Vec<Component> {
    fn from(pool: Pool) -> Self {
        pool.components
    }
}

/// Certification category of lots that carry no certification.
pub const CONVENTIONAL: &str = "Conventional";

/// Inventory and certification constraints applied before a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolFilter {
    /// Minimum available quantity for a lot to be used.
    #[serde(default)]
    pub min_quantity: f64,
    /// Allowed storage locations (`None` = any location).
    #[serde(default)]
    pub locations: Option<Vec<String>>,
    /// Certification categories to include (`None` = all). A lot passes if
    /// any of its certifications is listed; uncertified lots are [`CONVENTIONAL`].
    #[serde(default)]
    pub certifications: Option<Vec<String>>,
}

impl PoolFilter {
    /// Whether a component passes the filter.
    pub fn accepts(&self, component: &Component) -> bool {
        if component.quantity < self.min_quantity {
            return false;
        }

        if let Some(locations) = &self.locations {
            let allowed = component
                .location
                .as_ref()
                .is_some_and(|loc| locations.iter().any(|l| l.eq_ignore_ascii_case(loc)));
            if !allowed {
                return false;
            }
        }

        let Some(included) = &self.certifications else {
            return true;
        };
        let is_included =
            |category: &str| included.iter().any(|c| c.eq_ignore_ascii_case(category));
        if component.certifications.is_empty() {
            is_included(CONVENTIONAL)
        } else {
            component
                .certifications
                .iter()
                .any(|c| is_included(c.as_str()))
        }
    }
}

/// Flavor profile the search tries to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Target flavor vector (same dimensions as the pool).
    pub flavor: Vec<f64>,
    /// Target roast color, passed through to the flavor predictor.
    pub color: f64,
}

/// Pool construction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoolError {
    #[error("Candidate pool is empty")]
    Empty,
    #[error("No components left after applying the pool filter")]
    EmptyAfterFilter,
    #[error("Flavor vectors must have 4 or 5 dimensions, got {0}")]
    UnsupportedDimensions(usize),
    #[error("Component {index} has {found} flavor dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("Component {index} has a non-finite flavor or price")]
    NonFinite { index: usize },
    #[error("Mismatched input lengths: {ids} ids, {flavors} flavors, {prices} prices")]
    LengthMismatch {
        ids: usize,
        flavors: usize,
        prices: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(id: &str, quantity: f64, location: &str, certs: &[&str]) -> Component {
        Component {
            id: id.to_string(),
            flavor: vec![5.0, 5.0, 5.0, 5.0],
            price: 1.0,
            quantity,
            location: Some(location.to_string()),
            certifications: certs.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_from_parallel_length_mismatch() {
        let err = Pool::from_parallel(
            vec!["a".into(), "b".into()],
            vec![vec![1.0; 4]],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PoolError::LengthMismatch {
                ids: 2,
                flavors: 1,
                prices: 2
            }
        );
    }

    #[test]
    fn test_dimension_checks() {
        let err = Pool::from_parallel(
            vec!["a".into(), "b".into()],
            vec![vec![1.0; 4], vec![1.0; 5]],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert!(matches!(err, PoolError::DimensionMismatch { index: 1, .. }));

        let err = Pool::from_parallel(vec!["a".into()], vec![vec![1.0; 3]], vec![1.0]).unwrap_err();
        assert_eq!(err, PoolError::UnsupportedDimensions(3));

        assert_eq!(Pool::new(Vec::new()).unwrap_err(), PoolError::Empty);
    }

    #[test]
    fn test_filter() {
        let pool = Pool::new(vec![
            lot("1", 5000.0, "WAREHOUSE", &["Fairtrade"]),
            lot("2", 200.0, "WAREHOUSE", &["Fairtrade"]),
            lot("3", 5000.0, "SPOT", &["Fairtrade"]),
            lot("4", 5000.0, "SILOER", &[]),
        ])
        .unwrap();

        let filter = PoolFilter {
            min_quantity: 1000.0,
            locations: Some(vec!["warehouse".into(), "siloer".into()]),
            certifications: Some(vec!["fairtrade".into()]),
        };
        let filtered = pool.filtered(&filter).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.get(0).unwrap().id, "1");
        assert_eq!(filtered.index_of("1"), Some(0));

        let none = PoolFilter {
            min_quantity: 1e9,
            ..Default::default()
        };
        assert_eq!(pool.filtered(&none).unwrap_err(), PoolError::EmptyAfterFilter);
    }

    #[test]
    fn test_certification_categories() {
        let pool = Pool::new(vec![
            lot("fair", 5000.0, "WAREHOUSE", &["Fairtrade"]),
            lot("organic", 5000.0, "WAREHOUSE", &["Organic"]),
            lot("both", 5000.0, "WAREHOUSE", &["Fairtrade", "Organic"]),
            lot("rainforest", 5000.0, "WAREHOUSE", &["Rainforest"]),
            lot("plain", 5000.0, "WAREHOUSE", &[]),
        ])
        .unwrap();
        let ids = |filter: &PoolFilter| -> Vec<String> {
            pool.filtered(filter)
                .unwrap()
                .components()
                .iter()
                .map(|c| c.id.clone())
                .collect()
        };

        // No restriction keeps everything.
        assert_eq!(ids(&PoolFilter::default()).len(), 5);

        // Including two categories widens the pool rather than narrowing it.
        let filter = PoolFilter {
            certifications: Some(vec!["Fairtrade".into(), "Organic".into()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter), vec!["fair", "organic", "both"]);

        // Conventional admits uncertified lots only.
        let filter = PoolFilter {
            certifications: Some(vec![CONVENTIONAL.into()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter), vec!["plain"]);

        // Excluding conventional drops uncertified lots.
        let filter = PoolFilter {
            certifications: Some(vec!["rainforest".into(), "fairtrade".into()]),
            ..Default::default()
        };
        assert_eq!(ids(&filter), vec!["fair", "both", "rainforest"]);

        let filter = PoolFilter {
            certifications: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(pool.filtered(&filter).unwrap_err(), PoolError::EmptyAfterFilter);
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"[{"id": "a", "flavor": [1, 2, 3], "price": 1.0}]"#;
        assert!(serde_json::from_str::<Pool>(json).is_err());

        let json = r#"[{"id": "a", "flavor": [1, 2, 3, 4], "price": 1.0}]"#;
        let pool: Pool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.dimensions(), 4);
        assert_eq!(pool.get(0).unwrap().quantity, 0.0);
    }
}
