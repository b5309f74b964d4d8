//! Error types for ectuner.
//!
//! Every fallible operation in the library crates returns [`Result`], whose
//! error side is the single `thiserror`-derived [`Error`] enum below. The
//! `ensure!` and `fail!` macros are shorthands for the common early-return
//! patterns.
//!
//! Solver non-convergence is not an error: an
//! iteration-limited run still produces a usable result and is reported
//! through the optimization outcome instead.

use thiserror::Error;

/// The top-level error type used throughout ectuner.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sensitivity coefficient needed by a bias term is absent.
    #[error(
        "missing sensitivity for parameter '{parameter}' at \
         ({variable}, {season}, {region})"
    )]
    MissingData {
        /// Parameter lacking the coefficient.
        parameter: String,
        /// Flux variable of the term.
        variable: String,
        /// Season of the term.
        season: String,
        /// Region of the term.
        region: String,
    },

    /// A parameter value makes the penalty or relative change undefined.
    #[error("degenerate parameter '{parameter}': {reason}")]
    DegenerateParameter {
        /// Offending parameter.
        parameter: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Inconsistent or incomplete tuning configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Shorthand `Result` type used throughout ectuner.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ect_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ect_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ect_core::{fail, errors::Error};
/// fn always_err() -> ect_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
