//! Tuned-parameter output file.
//!
//! Written for the experiment launcher as
//! `tuning: { <group>: { <parameter>: <new value> } }`.

use crate::errors::{Error, Result};
use ect_core::Real;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct TuningOutput<'a> {
    tuning: &'a IndexMap<String, IndexMap<String, Real>>,
}

/// Render grouped new values as YAML.
pub fn to_yaml(grouped: &IndexMap<String, IndexMap<String, Real>>) -> Result<String> {
    serde_yaml_ng::to_string(&TuningOutput { tuning: grouped }).map_err(Error::Serialize)
}

/// Write grouped new values to `path`.
pub fn write_tuning(path: &Path, grouped: &IndexMap<String, IndexMap<String, Real>>) -> Result<()> {
    let text = to_yaml(grouped)?;
    std::fs::write(path, text).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "optimal parameter values written");
    Ok(())
}
