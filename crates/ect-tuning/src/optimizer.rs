//! Optimization driver.
//!
//! Builds the fixed problem data once, then runs the simplex minimizer from
//! the zero change vector under the per-parameter bounds.

use crate::bias::BiasModel;
use crate::constraints::MaxChangeConstraint;
use crate::objective::TuningObjective;
use crate::parameters::ParameterSet;
use crate::sensitivity::SensitivityModel;
use crate::weights::Weights;
use ect_core::{ensure, Real, Result};
use ect_math::optimization::{EndCriteria, EndCriteriaType, Simplex};
use ect_math::{close, close_enough, Array};
use indexmap::IndexMap;

/// Iteration budget used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Settings of the minimizer alone; the model data lives in the
/// [`TuningProblem`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// Iteration budget, shared by the first run and all restarts.
    pub max_iterations: usize,
    /// Initial simplex step as a fraction of each parameter's bound.
    pub initial_step_fraction: Real,
    /// Relative spread of simplex values at which a run has converged.
    pub function_epsilon: Real,
    /// Iterations without improvement after which a run has converged.
    pub max_stationary_iterations: usize,
    /// Restarts from the best point after a converged run.
    pub max_restarts: usize,
}

impl SolverSettings {
    /// Default settings with the given iteration budget.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            initial_step_fraction: 0.5,
            function_epsilon: 1e-12,
            max_stationary_iterations: 200,
            max_restarts: 20,
        }
    }

    /// Check every setting is usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_iterations > 0, "max_iterations must be at least 1");
        ensure!(
            self.initial_step_fraction > 0.0 && self.initial_step_fraction <= 1.0,
            "initial_step_fraction must lie in (0, 1], got {}",
            self.initial_step_fraction
        );
        ensure!(
            self.function_epsilon >= 0.0,
            "function_epsilon must be non-negative"
        );
        Ok(())
    }

    fn end_criteria(&self, max_iterations: usize) -> EndCriteria {
        EndCriteria::new(
            max_iterations,
            self.max_stationary_iterations,
            0.0,
            self.function_epsilon,
        )
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

/// Settings of one tuning run.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningOptions {
    /// Weight of the reference-deviation penalty. Must be positive.
    pub penalty: Real,
    /// Maximum change of each parameter as a fraction of its current value.
    pub increment: Real,
    /// Minimizer settings.
    pub solver: SolverSettings,
}

impl TuningOptions {
    /// Options with default solver settings.
    pub fn new(penalty: Real, increment: Real, max_iterations: usize) -> Self {
        Self {
            penalty,
            increment,
            solver: SolverSettings::new(max_iterations),
        }
    }

    /// Check every setting is usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.penalty.is_finite() && self.penalty > 0.0,
            "penalty must be positive, got {}",
            self.penalty
        );
        ensure!(
            self.increment.is_finite() && self.increment > 0.0,
            "increment must be positive, got {}",
            self.increment
        );
        self.solver.validate()
    }
}

/// Everything the minimizer needs, validated and read-only.
#[derive(Debug, Clone)]
pub struct TuningProblem {
    parameters: ParameterSet,
    objective: TuningObjective,
    constraint: MaxChangeConstraint,
}

impl TuningProblem {
    /// Validate the inputs and compile objective and constraints.
    ///
    /// All data errors surface here, before any optimization starts.
    pub fn build(
        current: &IndexMap<String, Real>,
        references: &IndexMap<String, Real>,
        sensitivity: &SensitivityModel,
        bias: &BiasModel,
        weights: &Weights,
        options: &TuningOptions,
    ) -> Result<Self> {
        options.validate()?;
        let parameters = ParameterSet::build(current, references, options.increment)?;
        Self::from_parameters(parameters, sensitivity, bias, weights, options.penalty)
    }

    /// Same as [`build`](Self::build) for an existing parameter set.
    pub fn from_parameters(
        parameters: ParameterSet,
        sensitivity: &SensitivityModel,
        bias: &BiasModel,
        weights: &Weights,
        penalty: Real,
    ) -> Result<Self> {
        let objective = TuningObjective::build(&parameters, sensitivity, bias, weights, penalty)?;
        let constraint = MaxChangeConstraint::new(&parameters);
        Ok(Self {
            parameters,
            objective,
            constraint,
        })
    }

    /// Tuned parameters in change-vector order.
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// The objective.
    pub fn objective(&self) -> &TuningObjective {
        &self.objective
    }

    /// The change bounds.
    pub fn constraint(&self) -> &MaxChangeConstraint {
        &self.constraint
    }

    /// The no-change starting point.
    pub fn initial_changes(&self) -> Array {
        Array::zeros(self.parameters.len())
    }
}

/// Result of a tuning run.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    /// Best change vector found.
    pub changes: Array,
    /// Score of the zero change vector.
    pub initial_score: Real,
    /// Score of `changes`. Never above `initial_score`.
    pub final_score: Real,
    /// Minimizer iterations used, over all restarts.
    pub iterations: usize,
    /// Restarts that were run after the first minimization.
    pub restarts: usize,
    /// Why the last minimization stopped.
    pub end_type: EndCriteriaType,
}

impl TuningOutcome {
    /// `false` when the run stopped on its iteration budget.
    pub fn converged(&self) -> bool {
        self.end_type.is_converged()
    }
}

/// Runs the minimizer over a [`TuningProblem`].
///
/// Penalty and bounds come from the problem; the tuner only decides how
/// hard to search.
#[derive(Debug, Clone, Default)]
pub struct Tuner {
    settings: SolverSettings,
}

impl Tuner {
    /// Create a tuner.
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// The minimizer settings.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Minimize the problem's objective from the zero change vector.
    ///
    /// Trial points are projected onto the change bounds, so the search
    /// slides along active bounds. A simplex squeezed against a bound can
    /// still stall, so after each converged run the search restarts from the
    /// best point with a fresh simplex, until a restart no longer improves
    /// the score.
    ///
    /// Hitting the iteration budget is not an error: the best change found
    /// is returned and a warning is logged.
    pub fn optimize(&self, problem: &TuningProblem) -> Result<TuningOutcome> {
        let settings = &self.settings;
        settings.validate()?;
        let objective = problem.objective();
        let constraint = problem.constraint();
        let start = problem.initial_changes();
        let initial_score = objective.value(&start);
        tracing::info!(score = initial_score, "score before optimization");

        let steps = constraint.bounds() * settings.initial_step_fraction;
        let mut changes = start;
        let mut final_score = initial_score;
        let mut iterations = 0;
        let mut restarts = 0;
        let end_type = loop {
            let result = Simplex::with_steps(steps.clone()).minimize(
                objective,
                constraint,
                &changes,
                &settings.end_criteria(settings.max_iterations - iterations),
            )?;
            iterations += result.iterations;

            let improvement = final_score - result.value;
            if result.value < final_score {
                changes = result.x;
                final_score = result.value;
            }

            let improved = improvement > settings.function_epsilon * final_score.abs();
            if !result.end_type.is_converged()
                || !improved
                || iterations >= settings.max_iterations
                || restarts >= settings.max_restarts
            {
                break result.end_type;
            }
            restarts += 1;
            tracing::debug!(score = final_score, restarts, "restarting simplex from best point");
        };

        if close_enough(final_score, initial_score, 42) {
            tracing::info!("no improvement over the unchanged parameters");
        }
        for ((p, &x), &bound) in problem
            .parameters()
            .iter()
            .zip(changes.iter())
            .zip(constraint.bounds().iter())
        {
            if close(x.abs(), bound, bound * 1e-6) {
                tracing::debug!(parameter = %p.name, change = x, "change is at its bound");
            }
        }

        if end_type.is_converged() {
            tracing::info!(
                score = final_score,
                iterations,
                restarts,
                "optimization converged ({end_type})"
            );
        } else {
            tracing::warn!(
                score = final_score,
                iterations,
                "optimization stopped at the iteration limit without converging; \
                 reporting best result so far"
            );
        }

        Ok(TuningOutcome {
            changes,
            initial_score,
            final_score,
            iterations,
            restarts,
            end_type,
        })
    }
}
