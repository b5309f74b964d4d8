//! Importance weights.

use crate::flux_table::FluxKey;
use ect_core::{Error, Real, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Independent flux-variable, season, and region weights.
///
/// The weight of a diagnostic is the product of its three component
/// weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight per flux variable.
    pub flux: IndexMap<String, Real>,
    /// Weight per season.
    pub season: IndexMap<String, Real>,
    /// Weight per region.
    pub region: IndexMap<String, Real>,
}

impl Weights {
    /// Bundle the three weight maps.
    pub fn new(
        flux: IndexMap<String, Real>,
        season: IndexMap<String, Real>,
        region: IndexMap<String, Real>,
    ) -> Self {
        Self {
            flux,
            season,
            region,
        }
    }

    /// Combined weight for `key`, or `None` if any component is missing.
    pub fn combined(&self, key: &FluxKey) -> Option<Real> {
        let flux = self.flux.get(&key.variable)?;
        let season = self.season.get(&key.season)?;
        let region = self.region.get(&key.region)?;
        Some(flux * season * region)
    }

    /// Check every weight is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (kind, map) in [
            ("flux", &self.flux),
            ("season", &self.season),
            ("region", &self.region),
        ] {
            for (name, &w) in map {
                if !(w.is_finite() && w >= 0.0) {
                    return Err(Error::Configuration(format!(
                        "{kind} weight for '{name}' must be finite and non-negative, got {w}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> Weights {
        Weights::new(
            IndexMap::from([("net_toa".to_string(), 2.0), ("tas".to_string(), 0.5)]),
            IndexMap::from([("ALL".to_string(), 1.0), ("DJF".to_string(), 0.25)]),
            IndexMap::from([("Global".to_string(), 3.0)]),
        )
    }

    #[test]
    fn product_of_components() {
        let w = weights();
        assert_eq!(w.combined(&FluxKey::new("net_toa", "ALL", "Global")), Some(6.0));
        assert_eq!(w.combined(&FluxKey::new("tas", "DJF", "Global")), Some(0.375));
    }

    #[test]
    fn any_missing_component_gives_none() {
        let w = weights();
        assert_eq!(w.combined(&FluxKey::new("pr", "ALL", "Global")), None);
        assert_eq!(w.combined(&FluxKey::new("tas", "JJA", "Global")), None);
        assert_eq!(w.combined(&FluxKey::new("tas", "ALL", "Tropical")), None);
    }

    #[test]
    fn negative_weight_rejected() {
        let mut w = weights();
        assert!(w.validate().is_ok());
        w.region.insert("Tropical".into(), -1.0);
        assert!(matches!(w.validate(), Err(Error::Configuration(_))));
    }
}
