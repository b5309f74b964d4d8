//! # ect-io
//!
//! File-facing glue around the tuning model: the YAML run configuration,
//! loaders for sensitivity, reference, simulated, and parameter files, the
//! grouped YAML output, and a plain-text parameter table.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Run configuration and command-line overrides.
pub mod config;

/// I/O error type.
pub mod errors;

/// Input file loaders.
pub mod inputs;

/// Tuned-parameter output file.
pub mod output;

/// Text rendering of tuning results.
pub mod table;

pub use config::{FileTemplates, InputPaths, Overrides, RunArgs, RunSettings, TunerConfig};
pub use errors::{Error, Result};
pub use inputs::{load_base, load_parameters, load_reference, load_sensitivity};
pub use output::write_tuning;
pub use table::{format_real, render_parameter_table};
