//! # ect-math
//!
//! Numerical building blocks for the tuner: the [`Array`] vector type used
//! as the optimizer's decision variable, floating-point comparison helpers,
//! and a derivative-free optimization framework with general inequality
//! constraints.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Dense real vector over nalgebra.
pub mod array;

/// Floating-point comparison utilities.
pub mod comparison;

/// Cost functions, constraints, end criteria, and the simplex minimizer.
pub mod optimization;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use comparison::{close, close_enough};
