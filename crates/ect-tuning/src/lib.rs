//! # ect-tuning
//!
//! The tuning model: given linear sensitivities of global-mean fluxes to a
//! handful of model parameters, the current flux biases, and importance
//! weights, find the parameter change that minimizes the weighted squared
//! post-change bias plus a penalty on drifting from reference parameter
//! values, while keeping every change within its allowed bound.
//!
//! Data flows leaf-first through the modules:
//!
//! 1. [`flux_table`] holds sparse variable → season → region tables.
//! 2. [`sensitivity`], [`bias`], and [`weights`] build the fixed model data.
//! 3. [`parameters`] fixes the parameter ordering and bounds.
//! 4. [`objective`] and [`constraints`] define what is minimized and where.
//! 5. [`optimizer`] drives the simplex minimizer from the zero change.
//! 6. [`report`] projects the winning change back into parameter space.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Sparse flux tables keyed by (variable, season, region).
pub mod flux_table;

/// Simulated-minus-reference flux biases.
pub mod bias;

/// Per-parameter flux sensitivity coefficients.
pub mod sensitivity;

/// Flux, season, and region importance weights.
pub mod weights;

/// Tuned parameters and their bounds.
pub mod parameters;

/// The scalar objective minimized by the tuner.
pub mod objective;

/// Per-parameter maximum-change constraints.
pub mod constraints;

/// Optimization driver.
pub mod optimizer;

/// Result projection and grouped export.
pub mod report;

pub use bias::BiasModel;
pub use constraints::MaxChangeConstraint;
pub use flux_table::{FluxKey, FluxTable};
pub use objective::{FluxOffset, FluxTerm, TuningObjective};
pub use optimizer::{SolverSettings, Tuner, TuningOptions, TuningOutcome, TuningProblem};
pub use parameters::{Parameter, ParameterSet};
pub use report::{ParameterChange, TuningReport};
pub use sensitivity::SensitivityModel;
pub use weights::Weights;
