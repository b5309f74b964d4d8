//! Sparse flux tables.
//!
//! A `FluxTable` is a three-level ordered map, variable → season → region →
//! value, mirroring the layout of the global-mean diagnostics it is loaded
//! from. Coverage is irregular (not every variable has every season or
//! region), so a missing entry is simply absent rather than a sentinel.

use ect_core::Real;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one flux diagnostic: variable, season, and region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FluxKey {
    /// Flux variable, e.g. `net_toa`.
    pub variable: String,
    /// Season, e.g. `ALL` or `DJF`.
    pub season: String,
    /// Region, e.g. `Global`.
    pub region: String,
}

impl FluxKey {
    /// Build a key from its three components.
    pub fn new(
        variable: impl Into<String>,
        season: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            season: season.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for FluxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.variable, self.season, self.region)
    }
}

type Regions = IndexMap<String, Real>;
type Seasons = IndexMap<String, Regions>;

/// Variable → season → region → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FluxTable(IndexMap<String, Seasons>);

impl FluxTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one value.
    pub fn insert(
        &mut self,
        variable: impl Into<String>,
        season: impl Into<String>,
        region: impl Into<String>,
        value: Real,
    ) {
        self.0
            .entry(variable.into())
            .or_default()
            .entry(season.into())
            .or_default()
            .insert(region.into(), value);
    }

    /// Three-level lookup; `None` as soon as any level is missing.
    pub fn get(&self, variable: &str, season: &str, region: &str) -> Option<Real> {
        self.0.get(variable)?.get(season)?.get(region).copied()
    }

    /// Lookup by key.
    pub fn get_key(&self, key: &FluxKey) -> Option<Real> {
        self.get(&key.variable, &key.season, &key.region)
    }

    /// Season → region map for one variable.
    pub fn seasons(&self, variable: &str) -> Option<&IndexMap<String, IndexMap<String, Real>>> {
        self.0.get(variable)
    }

    /// Variables in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every `(key, value)` entry in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FluxKey, Real)> + '_ {
        self.0.iter().flat_map(|(variable, seasons)| {
            seasons.iter().flat_map(move |(season, regions)| {
                regions
                    .iter()
                    .map(move |(region, &value)| (FluxKey::new(variable, season, region), value))
            })
        })
    }

    /// Every key in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = FluxKey> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Number of leaf values.
    pub fn len(&self) -> usize {
        self.0
            .values()
            .flat_map(|seasons| seasons.values())
            .map(|regions| regions.len())
            .sum()
    }

    /// Whether the table has no leaf values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(FluxKey, Real)> for FluxTable {
    fn from_iter<I: IntoIterator<Item = (FluxKey, Real)>>(iter: I) -> Self {
        let mut table = FluxTable::new();
        for (key, value) in iter {
            table.insert(key.variable, key.season, key.region, value);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FluxTable {
        let mut t = FluxTable::new();
        t.insert("net_toa", "ALL", "Global", 0.8);
        t.insert("net_toa", "ALL", "North Midlat", 1.1);
        t.insert("tas", "DJF", "Global", 287.1);
        t
    }

    #[test]
    fn lookup_each_level() {
        let t = sample();
        assert_eq!(t.get("net_toa", "ALL", "Global"), Some(0.8));
        assert_eq!(t.get("net_toa", "ALL", "Tropical"), None);
        assert_eq!(t.get("net_toa", "JJA", "Global"), None);
        assert_eq!(t.get("pr", "ALL", "Global"), None);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let keys: Vec<String> = sample().keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "net_toa ALL Global",
                "net_toa ALL North Midlat",
                "tas DJF Global"
            ]
        );
    }

    #[test]
    fn len_counts_leaves() {
        assert_eq!(sample().len(), 3);
        assert!(FluxTable::new().is_empty());
    }

    #[test]
    fn collect_from_pairs() {
        let t: FluxTable = vec![
            (FluxKey::new("tas", "ALL", "Global"), 0.5),
            (FluxKey::new("tas", "ALL", "Global"), 0.7),
        ]
        .into_iter()
        .collect();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("tas", "ALL", "Global"), Some(0.7));
    }
}
