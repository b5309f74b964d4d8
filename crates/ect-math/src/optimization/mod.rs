//! Optimization framework.
//!
//! Provides the scalar cost-function trait, inequality constraints, end
//! criteria, and a derivative-free constrained minimizer ([`Simplex`]).

mod simplex;

pub use simplex::Simplex;

use crate::array::Array;
use ect_core::Real;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A scalar objective over a multi-dimensional decision vector.
pub trait CostFunction {
    /// Evaluate the cost at `x`. Lower is better.
    fn value(&self, x: &Array) -> Real;
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A set of inequality constraints `g_k(x) >= 0`.
///
/// Each constraint contributes one entry to [`Constraint::values`]; a point
/// is feasible when every entry is non-negative. A value of exactly zero is
/// on the boundary and still feasible.
pub trait Constraint {
    /// Evaluate every inequality at `x`.
    fn values(&self, x: &Array) -> Array;

    /// Return `true` if `x` satisfies all inequalities.
    fn test(&self, x: &Array) -> bool {
        self.values(x).iter().all(|&g| g >= 0.0)
    }

    /// Nearest feasible point to `x`, for constraints where that is cheap
    /// to compute (boxes). The default returns `x` unchanged, leaving
    /// infeasible points to be rejected by the caller.
    fn project(&self, x: &Array) -> Array {
        x.clone()
    }
}

/// No constraint: every point is feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn values(&self, _x: &Array) -> Array {
        Array::zeros(0)
    }

    fn test(&self, _x: &Array) -> bool {
        true
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
#[derive(Debug, Clone)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of iterations without improving the best value.
    pub max_stationary_state_iterations: usize,
    /// Stop when the best value drops below this.
    pub root_epsilon: Real,
    /// Stop when the relative spread of values across the simplex drops
    /// below this.
    pub function_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: Real,
        function_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
        }
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_stationary_state_iterations: 100,
            root_epsilon: 1e-14,
            function_epsilon: 1e-12,
        }
    }
}

/// The reason an optimization terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Maximum iterations reached.
    MaxIterations,
    /// Function value below root epsilon.
    RootEpsilon,
    /// Simplex values agree to within function epsilon.
    FunctionEpsilon,
    /// Maximum stationary-state iterations reached.
    StationaryPoint,
}

impl EndCriteriaType {
    /// Whether the run met a convergence tolerance rather than running out
    /// of iterations.
    pub fn is_converged(self) -> bool {
        !matches!(self, EndCriteriaType::MaxIterations)
    }
}

impl std::fmt::Display for EndCriteriaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndCriteriaType::MaxIterations => "iteration limit reached",
            EndCriteriaType::RootEpsilon => "value below root epsilon",
            EndCriteriaType::FunctionEpsilon => "function values converged",
            EndCriteriaType::StationaryPoint => "stationary point",
        };
        f.write_str(s)
    }
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best point found.
    pub x: Array,
    /// Cost at `x`.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}
