//! Input file loaders.
//!
//! Each loader has a `parse_*` counterpart working on YAML text so the
//! format handling can be exercised without touching the filesystem.

use crate::errors::{parse_yaml, read_to_string, Result};
use ect_core::{Error as CoreError, Real};
use ect_tuning::{FluxKey, FluxTable, SensitivityModel};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

type Nested<T> = IndexMap<String, IndexMap<String, IndexMap<String, T>>>;

/// A sensitivity is stored as a one-element list, occasionally as a bare
/// number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coefficient {
    Scalar(Real),
    Sequence(Vec<Real>),
}

/// Parse `param → flux → season → region → [coefficient]`.
pub fn parse_sensitivity(path: &Path, text: &str) -> Result<SensitivityModel> {
    let raw: IndexMap<String, Nested<Coefficient>> = parse_yaml(path, text)?;
    let mut model = SensitivityModel::new();
    for (parameter, fluxes) in raw {
        for (variable, seasons) in fluxes {
            for (season, regions) in seasons {
                for (region, coefficient) in regions {
                    let value = match coefficient {
                        Coefficient::Scalar(v) => v,
                        Coefficient::Sequence(values) => {
                            *values.first().ok_or_else(|| {
                                CoreError::Configuration(format!(
                                    "{}: empty sensitivity for '{parameter}' at \
                                     ({variable}, {season}, {region})",
                                    path.display()
                                ))
                            })?
                        }
                    };
                    model.insert(
                        parameter.as_str(),
                        FluxKey::new(variable.as_str(), season.as_str(), region.as_str()),
                        value,
                    );
                }
            }
        }
    }
    tracing::debug!(
        path = %path.display(),
        parameters = model.parameters().count(),
        "sensitivities loaded"
    );
    Ok(model)
}

/// Load a sensitivity file.
pub fn load_sensitivity(path: &Path) -> Result<SensitivityModel> {
    parse_sensitivity(path, &read_to_string(path)?)
}

/// Regional statistics of an observation; only the mean is used.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RegionObservation {
    Value(Real),
    Stats { mean: Option<Real> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Observation {
    Global(Real),
    Seasonal(IndexMap<String, IndexMap<String, Option<RegionObservation>>>),
}

#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    #[serde(default)]
    obs: Option<Observation>,
}

/// Parse a reference file: `variable → { obs: ... }`.
///
/// A scalar `obs` is a global annual value and becomes
/// `ALL → Global`; a mapping is `season → region → { mean, ... }` and the
/// mean is kept.
pub fn parse_reference(path: &Path, text: &str) -> Result<FluxTable> {
    let raw: IndexMap<String, ReferenceEntry> = parse_yaml(path, text)?;
    let mut table = FluxTable::new();
    for (variable, entry) in raw {
        match entry.obs {
            None => tracing::debug!(%variable, "reference has no observation, skipping"),
            Some(Observation::Global(value)) => table.insert(variable, "ALL", "Global", value),
            Some(Observation::Seasonal(seasons)) => {
                for (season, regions) in seasons {
                    for (region, observation) in regions {
                        let mean = match observation {
                            Some(RegionObservation::Value(v)) => Some(v),
                            Some(RegionObservation::Stats { mean }) => mean,
                            None => None,
                        };
                        if let Some(mean) = mean {
                            table.insert(variable.as_str(), season.as_str(), region, mean);
                        }
                    }
                }
            }
        }
    }
    Ok(table)
}

/// Load a reference file.
pub fn load_reference(path: &Path) -> Result<FluxTable> {
    parse_reference(path, &read_to_string(path)?)
}

/// Parse simulated global means: `variable → season → region → value`.
/// Null values are dropped.
pub fn parse_base(path: &Path, text: &str) -> Result<FluxTable> {
    let raw: Nested<Option<Real>> = parse_yaml(path, text)?;
    let mut table = FluxTable::new();
    for (variable, seasons) in raw {
        for (season, regions) in seasons {
            for (region, value) in regions {
                if let Some(value) = value {
                    table.insert(variable.as_str(), season.as_str(), region, value);
                }
            }
        }
    }
    Ok(table)
}

/// Load simulated global means.
pub fn load_base(path: &Path) -> Result<FluxTable> {
    parse_base(path, &read_to_string(path)?)
}

/// Parse `parameter → current value`, keeping file order.
pub fn parse_parameters(path: &Path, text: &str) -> Result<IndexMap<String, Real>> {
    parse_yaml(path, text)
}

/// Load current parameter values.
pub fn load_parameters(path: &Path) -> Result<IndexMap<String, Real>> {
    parse_parameters(path, &read_to_string(path)?)
}
