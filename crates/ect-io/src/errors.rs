//! Errors raised while reading or writing tuner files.

use std::path::PathBuf;
use thiserror::Error;

/// Error type of the I/O layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A file did not parse as the expected YAML structure.
    #[error("{}: {source}", path.display())]
    Yaml {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml_ng::Error,
    },

    /// Results could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_yaml_ng::Error),

    /// A model-level error.
    #[error(transparent)]
    Tuning(#[from] ect_core::Error),
}

/// Shorthand `Result` type of the I/O layer.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Read `path` into a string.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse YAML text read from `path`.
pub(crate) fn parse_yaml<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
    text: &str,
) -> Result<T> {
    serde_yaml_ng::from_str(text).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
