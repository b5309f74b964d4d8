//! # ectuner
//!
//! Tuning of EC-Earth model parameters from linear flux sensitivities.
//!
//! This crate is a **façade** over the workspace crates and also ships the
//! `ectuner` command-line tool.
//!
//! ```rust
//! use ectuner::tuning::FluxKey;
//!
//! let key = FluxKey::new("net_toa", "ALL", "Global");
//! assert_eq!(key.to_string(), "net_toa ALL Global");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ect_core as core;

/// Change-vector arithmetic and the constrained simplex minimizer.
pub use ect_math as math;

/// The tuning model: biases, sensitivities, weights, objective, driver.
pub use ect_tuning as tuning;

/// Configuration, input loaders, and output writers.
pub use ect_io as io;
