//! Projection of a tuning outcome back into parameter and flux space.

use crate::objective::FluxOffset;
use crate::optimizer::{TuningOutcome, TuningProblem};
use ect_core::{ensure, Error, Real, Result};
use ect_math::Array;
use indexmap::IndexMap;

/// Before/after view of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    /// Parameter name.
    pub name: String,
    /// `old_value + change`.
    pub new_value: Real,
    /// Value before tuning.
    pub old_value: Real,
    /// Absolute change.
    pub change: Real,
    /// `change / old_value`.
    pub relative_change: Real,
    /// Allowed absolute change.
    pub max_change: Real,
}

/// Everything worth presenting about a tuning run.
#[derive(Debug, Clone)]
pub struct TuningReport {
    /// One row per parameter, in change-vector order.
    pub parameters: Vec<ParameterChange>,
    /// Projected flux biases with no change.
    pub offsets_before: Vec<FluxOffset>,
    /// Projected flux biases with the optimal change.
    pub offsets_after: Vec<FluxOffset>,
    /// Score with no change.
    pub initial_score: Real,
    /// Score with the optimal change.
    pub final_score: Real,
    /// Whether the minimizer met its tolerance.
    pub converged: bool,
}

impl TuningReport {
    /// Build the report for `outcome` on `problem`.
    ///
    /// # Errors
    /// [`Error::DegenerateParameter`] if a parameter's current value is zero,
    /// and [`Error::Precondition`] if the change vector has the wrong length.
    pub fn new(problem: &TuningProblem, outcome: &TuningOutcome) -> Result<Self> {
        let changes = &outcome.changes;
        let parameters = problem.parameters();
        ensure!(
            changes.size() == parameters.len(),
            "expected {} changes, got {}",
            parameters.len(),
            changes.size()
        );

        let rows = parameters
            .iter()
            .zip(changes.iter())
            .map(|(p, &change)| {
                if p.current == 0.0 {
                    return Err(Error::DegenerateParameter {
                        parameter: p.name.clone(),
                        reason: "relative change of a zero value".to_string(),
                    });
                }
                Ok(ParameterChange {
                    name: p.name.clone(),
                    new_value: p.new_value(change),
                    old_value: p.current,
                    change,
                    relative_change: change / p.current,
                    max_change: p.max_change,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let objective = problem.objective();
        Ok(Self {
            parameters: rows,
            offsets_before: objective.offsets(&Array::zeros(changes.size())),
            offsets_after: objective.offsets(changes),
            initial_score: outcome.initial_score,
            final_score: outcome.final_score,
            converged: outcome.converged(),
        })
    }

    /// Row for parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<&ParameterChange> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// New values arranged by output group, then parameter, in the order
    /// given by `groups`.
    ///
    /// # Errors
    /// [`Error::Configuration`] if a group names an untuned parameter.
    pub fn grouped(
        &self,
        groups: &IndexMap<String, Vec<String>>,
    ) -> Result<IndexMap<String, IndexMap<String, Real>>> {
        groups
            .iter()
            .map(|(group, names)| {
                let values = names
                    .iter()
                    .map(|name| {
                        self.parameter(name)
                            .map(|p| (name.clone(), p.new_value))
                            .ok_or_else(|| {
                                Error::Configuration(format!(
                                    "group '{group}' lists unknown parameter '{name}'"
                                ))
                            })
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;
                Ok((group.clone(), values))
            })
            .collect()
    }
}
