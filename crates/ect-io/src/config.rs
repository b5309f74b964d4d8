//! Run configuration.
//!
//! The YAML file names the input files (as templates over the experiment
//! and year range), the reference parameter values, the three weight
//! tables, the output grouping, and default run arguments. Command-line
//! values override the `args` section.

use crate::errors::{parse_yaml, read_to_string, Result};
use ect_core::{Error as CoreError, Real};
use ect_tuning::optimizer::DEFAULT_MAX_ITERATIONS;
use ect_tuning::{TuningOptions, Weights};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default run arguments; each can be overridden on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunArgs {
    /// First year of the analysed period.
    #[serde(default)]
    pub year1: Option<i32>,
    /// Last year of the analysed period.
    #[serde(default)]
    pub year2: Option<i32>,
    /// Reference-deviation penalty coefficient.
    #[serde(default)]
    pub penalty: Option<Real>,
    /// Fractional maximum parameter change.
    #[serde(default)]
    pub inc: Option<Real>,
    /// Iteration budget.
    #[serde(default)]
    pub maxiter: Option<usize>,
}

/// Input file name templates.
///
/// `{exp}`, `{year1}` and `{year2}` are substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTemplates {
    /// Sensitivity file.
    pub sensitivity: String,
    /// Reference (observation) file.
    pub reference: String,
    /// Directory holding the simulated global means.
    pub ecmean: String,
    /// Simulated global-mean file, inside `ecmean`.
    pub base: String,
    /// Directory holding experiment parameter files.
    pub exps: String,
    /// Experiment parameter file, inside `exps`.
    pub params: String,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Default run arguments.
    #[serde(default)]
    pub args: RunArgs,
    /// Value each parameter is pulled towards by the penalty.
    pub reference_parameters: IndexMap<String, Real>,
    /// Flux-variable weights.
    pub weights: IndexMap<String, Real>,
    /// Season weights.
    pub weights_season: IndexMap<String, Real>,
    /// Region weights.
    pub weights_region: IndexMap<String, Real>,
    /// Input files.
    pub files: FileTemplates,
    /// Output grouping: group → parameters.
    #[serde(default)]
    pub parameter_group: IndexMap<String, Vec<String>>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// First year.
    pub year1: Option<i32>,
    /// Last year.
    pub year2: Option<i32>,
    /// Penalty coefficient.
    pub penalty: Option<Real>,
    /// Fractional increment.
    pub inc: Option<Real>,
    /// Iteration budget.
    pub maxiter: Option<usize>,
}

/// Concrete input locations of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPaths {
    /// Sensitivity file.
    pub sensitivity: PathBuf,
    /// Reference file.
    pub reference: PathBuf,
    /// Simulated global means.
    pub base: PathBuf,
    /// Current parameter values.
    pub params: PathBuf,
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Experiment being tuned.
    pub exp: String,
    /// First year.
    pub year1: i32,
    /// Last year.
    pub year2: i32,
    /// Tuning options.
    pub options: TuningOptions,
    /// Input files.
    pub paths: InputPaths,
}

impl TunerConfig {
    /// Parse YAML text.
    pub fn from_yaml_str(path: &Path, text: &str) -> Result<Self> {
        parse_yaml(path, text)
    }

    /// Read and parse a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = read_to_string(path)?;
        Self::from_yaml_str(path, &text)
    }

    /// The three weight tables.
    pub fn weights(&self) -> Weights {
        Weights::new(
            self.weights.clone(),
            self.weights_season.clone(),
            self.weights_region.clone(),
        )
    }

    /// Combine config defaults with command-line overrides.
    ///
    /// # Errors
    /// [`ect_core::Error::Configuration`] if a year, the penalty, or the
    /// increment is given nowhere.
    pub fn resolve(&self, exp: &str, overrides: &Overrides) -> Result<RunSettings> {
        let year1 = required(overrides.year1.or(self.args.year1), "year1")?;
        let year2 = required(overrides.year2.or(self.args.year2), "year2")?;
        let penalty = required(overrides.penalty.or(self.args.penalty), "penalty")?;
        let inc = required(overrides.inc.or(self.args.inc), "inc")?;
        let maxiter = overrides
            .maxiter
            .or(self.args.maxiter)
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        let options = TuningOptions::new(penalty, inc, maxiter);
        options.validate()?;

        let fill = |template: &str| expand(template, exp, year1, year2);
        let files = &self.files;
        let paths = InputPaths {
            sensitivity: PathBuf::from(fill(&files.sensitivity)),
            reference: PathBuf::from(fill(&files.reference)),
            base: Path::new(&fill(&files.ecmean)).join(fill(&files.base)),
            params: Path::new(&fill(&files.exps)).join(fill(&files.params)),
        };

        Ok(RunSettings {
            exp: exp.to_string(),
            year1,
            year2,
            options,
            paths,
        })
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| {
        CoreError::Configuration(format!("'{name}' is set neither in config nor on the command line"))
            .into()
    })
}

/// Substitute `{exp}`, `{year1}` and `{year2}` in a file template.
pub fn expand(template: &str, exp: &str, year1: i32, year2: i32) -> String {
    template
        .replace("{exp}", exp)
        .replace("{year1}", &year1.to_string())
        .replace("{year2}", &year2.to_string())
}
