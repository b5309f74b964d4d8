//! Sensitivity coefficients.
//!
//! For each tuned parameter, a [`FluxTable`] of linear sensitivities: the
//! change in a flux diagnostic per unit change of that parameter.

use crate::flux_table::{FluxKey, FluxTable};
use ect_core::{Error, Real, Result};
use indexmap::{IndexMap, IndexSet};

/// Parameter → (variable, season, region) → d(flux)/d(parameter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitivityModel {
    tables: IndexMap<String, FluxTable>,
}

impl SensitivityModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-parameter tables.
    pub fn from_tables(tables: IndexMap<String, FluxTable>) -> Self {
        Self { tables }
    }

    /// Set one coefficient.
    pub fn insert(&mut self, parameter: impl Into<String>, key: FluxKey, coefficient: Real) {
        self.tables
            .entry(parameter.into())
            .or_default()
            .insert(key.variable, key.season, key.region, coefficient);
    }

    /// Table for one parameter.
    pub fn table(&self, parameter: &str) -> Option<&FluxTable> {
        self.tables.get(parameter)
    }

    /// Parameters with a sensitivity table, in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Coefficient for `parameter` at `key`.
    ///
    /// # Errors
    /// [`Error::MissingData`] when the parameter has no table or the table
    /// lacks `key`. Missing sensitivities are never read as zero.
    pub fn coefficient(&self, parameter: &str, key: &FluxKey) -> Result<Real> {
        self.tables
            .get(parameter)
            .and_then(|t| t.get_key(key))
            .ok_or_else(|| Error::MissingData {
                parameter: parameter.to_string(),
                variable: key.variable.clone(),
                season: key.season.clone(),
                region: key.region.clone(),
            })
    }

    /// Union of the diagnostics covered by the given parameters' tables, in
    /// first-seen order.
    pub fn term_keys<'a>(&self, parameters: impl IntoIterator<Item = &'a str>) -> Vec<FluxKey> {
        let mut keys = IndexSet::new();
        for name in parameters {
            if let Some(table) = self.tables.get(name) {
                keys.extend(table.keys());
            }
        }
        keys.into_iter().collect()
    }
}
