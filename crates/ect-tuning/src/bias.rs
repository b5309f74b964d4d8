//! Flux biases: simulated minus reference.

use crate::flux_table::{FluxKey, FluxTable};
use ect_core::Real;

/// Current simulated-minus-reference difference per flux diagnostic.
///
/// Only diagnostics present in *both* tables at all three levels appear;
/// anything else is absent, never zero. An entry whose value is NaN (a NaN
/// on either input side) is kept but treated the same as an absent one by
/// [`BiasModel::defined`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiasModel {
    table: FluxTable,
}

impl BiasModel {
    /// Compute `simulated - reference` over the keys both tables share.
    pub fn compute(simulated: &FluxTable, reference: &FluxTable) -> Self {
        let table = simulated
            .iter()
            .filter_map(|(key, sim)| reference.get_key(&key).map(|obs| (key, sim - obs)))
            .collect();
        Self { table }
    }

    /// Wrap an already-computed bias table.
    pub fn from_table(table: FluxTable) -> Self {
        Self { table }
    }

    /// Stored bias, including NaN entries.
    pub fn get(&self, key: &FluxKey) -> Option<Real> {
        self.table.get_key(key)
    }

    /// Bias for `key` if present and not NaN.
    pub fn defined(&self, key: &FluxKey) -> Option<Real> {
        self.get(key).filter(|b| !b.is_nan())
    }

    /// The underlying table.
    pub fn table(&self) -> &FluxTable {
        &self.table
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no diagnostic matched.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
