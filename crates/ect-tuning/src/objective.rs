//! The tuning objective.
//!
//! For a change vector `x` (one entry per parameter, in [`ParameterSet`]
//! order) the score is
//!
//! ```text
//! Σ_terms  w · (b + s·x)²   +   penalty · Σ_params ((ref - (cur + x)) / ref)²
//! ```
//!
//! where each term is one flux diagnostic with current bias `b`, combined
//! weight `w`, and per-parameter sensitivities `s`. The first sum is a
//! linearised weighted least-squares fit of the post-change biases to zero;
//! the second pulls parameters towards their reference values.
//!
//! The set of terms is fixed when the objective is built. Diagnostics come
//! from the sensitivity tables; one is dropped if its bias is absent or NaN
//! or any of its weights is missing. Evaluation after that is pure
//! arithmetic and cannot fail.

use crate::bias::BiasModel;
use crate::flux_table::FluxKey;
use crate::parameters::ParameterSet;
use crate::sensitivity::SensitivityModel;
use crate::weights::Weights;
use ect_core::{ensure, Real, Result};
use ect_math::optimization::CostFunction;
use ect_math::Array;

/// One evaluated flux diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxTerm {
    /// The diagnostic.
    pub key: FluxKey,
    /// Current simulated-minus-reference bias.
    pub bias: Real,
    /// Product of the flux, season, and region weights.
    pub weight: Real,
    /// Sensitivity to each parameter, in change-vector order.
    pub coefficients: Array,
}

impl FluxTerm {
    /// Bias after applying `changes` under the linear approximation.
    pub fn projected_bias(&self, changes: &Array) -> Real {
        self.bias + self.coefficients.dot(changes)
    }
}

/// Projected bias of one diagnostic under a given change vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxOffset {
    /// The diagnostic.
    pub key: FluxKey,
    /// `bias + Σ sensitivity × change`.
    pub offset: Real,
}

/// Weighted squared flux biases plus reference-deviation penalty.
#[derive(Debug, Clone)]
pub struct TuningObjective {
    terms: Vec<FluxTerm>,
    current: Array,
    reference: Array,
    penalty: Real,
}

impl TuningObjective {
    /// Compile the objective from the model data.
    ///
    /// # Errors
    /// - [`ect_core::Error::MissingData`] if any parameter lacks a
    ///   sensitivity for a diagnostic that has a defined bias and weights.
    /// - [`ect_core::Error::Precondition`] if `penalty` is not positive or a
    ///   used sensitivity is not finite.
    /// - [`ect_core::Error::Configuration`] for negative or non-finite
    ///   weights.
    pub fn build(
        parameters: &ParameterSet,
        sensitivity: &SensitivityModel,
        bias: &BiasModel,
        weights: &Weights,
        penalty: Real,
    ) -> Result<Self> {
        ensure!(
            penalty.is_finite() && penalty > 0.0,
            "penalty coefficient must be positive, got {penalty}"
        );
        weights.validate()?;

        let mut terms = Vec::new();
        for key in sensitivity.term_keys(parameters.names()) {
            let Some(b) = bias.defined(&key) else {
                tracing::debug!(term = %key, "no defined bias, skipping");
                continue;
            };
            let Some(weight) = weights.combined(&key) else {
                tracing::debug!(term = %key, "no weight, skipping");
                continue;
            };
            let coefficients = parameters
                .names()
                .map(|name| sensitivity.coefficient(name, &key))
                .collect::<Result<Vec<_>>>()?;
            ensure!(
                coefficients.iter().all(|c| c.is_finite()),
                "non-finite sensitivity for {key}"
            );
            terms.push(FluxTerm {
                key,
                bias: b,
                weight,
                coefficients: coefficients.into(),
            });
        }
        tracing::debug!(terms = terms.len(), "objective compiled");

        Ok(Self {
            terms,
            current: parameters.current_values(),
            reference: parameters.iter().map(|p| p.reference).collect::<Vec<_>>().into(),
            penalty,
        })
    }

    /// Number of parameters the objective expects.
    pub fn dimension(&self) -> usize {
        self.current.size()
    }

    /// The diagnostics that contribute to the flux term.
    pub fn terms(&self) -> &[FluxTerm] {
        &self.terms
    }

    /// Penalty coefficient.
    pub fn penalty(&self) -> Real {
        self.penalty
    }

    /// Σ w · (b + s·x)².
    pub fn flux_term(&self, changes: &Array) -> Real {
        self.terms
            .iter()
            .map(|t| {
                let projected = t.projected_bias(changes);
                t.weight * projected * projected
            })
            .sum()
    }

    /// Unscaled Σ ((ref - (cur + x)) / ref)².
    pub fn deviation(&self, changes: &Array) -> Real {
        self.reference
            .iter()
            .zip(self.current.iter())
            .zip(changes.iter())
            .map(|((&r, &c), &x)| {
                let d = (r - (c + x)) / r;
                d * d
            })
            .sum()
    }

    /// `penalty` × [`deviation`](Self::deviation).
    pub fn penalty_term(&self, changes: &Array) -> Real {
        self.penalty * self.deviation(changes)
    }

    /// Total score. Non-negative; lower is better.
    pub fn value(&self, changes: &Array) -> Real {
        debug_assert_eq!(changes.size(), self.dimension());
        self.flux_term(changes) + self.penalty_term(changes)
    }

    /// Projected bias of every term under `changes`.
    pub fn offsets(&self, changes: &Array) -> Vec<FluxOffset> {
        self.terms
            .iter()
            .map(|t| FluxOffset {
                key: t.key.clone(),
                offset: t.projected_bias(changes),
            })
            .collect()
    }
}

impl CostFunction for TuningObjective {
    fn value(&self, x: &Array) -> Real {
        TuningObjective::value(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux_table::FluxTable;
    use approx::assert_abs_diff_eq;
    use ect_core::Error;
    use indexmap::IndexMap;

    fn unit_weights() -> Weights {
        Weights::new(
            IndexMap::from([("net_toa".to_string(), 1.0), ("tas".to_string(), 2.0)]),
            IndexMap::from([("ALL".to_string(), 1.0)]),
            IndexMap::from([("Global".to_string(), 1.0), ("Tropical".to_string(), 0.5)]),
        )
    }

    fn two_parameters() -> ParameterSet {
        let current = IndexMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]);
        let reference = IndexMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.5)]);
        ParameterSet::build(&current, &reference, 0.1).unwrap()
    }

    fn bias_of(entries: &[(&str, &str, Real)]) -> BiasModel {
        let mut t = FluxTable::new();
        for (v, r, b) in entries {
            t.insert(*v, "ALL", *r, *b);
        }
        BiasModel::from_table(t)
    }

    fn sensitivity() -> SensitivityModel {
        let mut s = SensitivityModel::new();
        s.insert("a", FluxKey::new("net_toa", "ALL", "Global"), 2.0);
        s.insert("b", FluxKey::new("net_toa", "ALL", "Global"), -1.0);
        s.insert("a", FluxKey::new("tas", "ALL", "Tropical"), 0.5);
        s.insert("b", FluxKey::new("tas", "ALL", "Tropical"), 1.0);
        s
    }

    #[test]
    fn zero_change_flux_term_is_weighted_squared_bias() {
        let bias = bias_of(&[("net_toa", "Global", 0.3), ("tas", "Tropical", -0.4)]);
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &unit_weights(), 0.1)
            .unwrap();
        let zero = Array::zeros(2);
        // 1·0.3² + (2·0.5)·0.4²
        assert_abs_diff_eq!(obj.flux_term(&zero), 0.09 + 0.16, epsilon = 1e-12);
    }

    #[test]
    fn flux_term_uses_linear_projection() {
        let bias = bias_of(&[("net_toa", "Global", 0.3)]);
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &unit_weights(), 0.1)
            .unwrap();
        let x = Array::from_slice(&[0.05, 0.1]);
        // 0.3 + 2·0.05 - 1·0.1 = 0.3
        assert_abs_diff_eq!(obj.flux_term(&x), 0.09, epsilon = 1e-12);
        let x = Array::from_slice(&[-0.15, 0.0]);
        assert_abs_diff_eq!(obj.flux_term(&x), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn penalty_vanishes_at_reference() {
        let bias = bias_of(&[("net_toa", "Global", 0.3)]);
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &unit_weights(), 0.1)
            .unwrap();
        // b is 2.0 with reference 2.5
        assert_abs_diff_eq!(obj.penalty_term(&Array::zeros(2)), 0.1 * 0.04, epsilon = 1e-12);
        assert_eq!(obj.penalty_term(&Array::from_slice(&[0.0, 0.5])), 0.0);
        assert!(obj.penalty_term(&Array::from_slice(&[1e-3, 0.5])) > 0.0);
    }

    #[test]
    fn terms_without_bias_do_not_contribute() {
        let with = bias_of(&[("net_toa", "Global", 0.3)]);
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &with, &unit_weights(), 0.1)
            .unwrap();
        // tas/Tropical has sensitivities but no bias
        assert_eq!(obj.terms().len(), 1);
        let x = Array::from_slice(&[0.07, -0.02]);
        let expected = (0.3_f64 + 2.0 * 0.07 + 0.02).powi(2) + obj.penalty_term(&x);
        assert_abs_diff_eq!(obj.value(&x), expected, epsilon = 1e-12);
    }

    #[test]
    fn nan_bias_and_missing_weight_are_skipped() {
        let bias = bias_of(&[("net_toa", "Global", f64::NAN), ("tas", "Tropical", 0.2)]);
        let mut weights = unit_weights();
        weights.region.shift_remove("Tropical");
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &weights, 0.1)
            .unwrap();
        assert!(obj.terms().is_empty());
        assert_eq!(obj.flux_term(&Array::from_slice(&[0.1, 0.1])), 0.0);
    }

    #[test]
    fn missing_sensitivity_fails_at_build() {
        let mut s = sensitivity();
        s.insert("a", FluxKey::new("net_toa", "ALL", "Tropical"), 1.0);
        let bias = bias_of(&[("net_toa", "Tropical", 0.3)]);
        let err = TuningObjective::build(&two_parameters(), &s, &bias, &unit_weights(), 0.1)
            .unwrap_err();
        assert_eq!(
            err,
            Error::MissingData {
                parameter: "b".into(),
                variable: "net_toa".into(),
                season: "ALL".into(),
                region: "Tropical".into(),
            }
        );
    }

    #[test]
    fn penalty_must_be_positive() {
        let bias = bias_of(&[]);
        assert!(
            TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &unit_weights(), 0.0)
                .is_err()
        );
    }

    #[test]
    fn offsets_report_projected_biases() {
        let bias = bias_of(&[("net_toa", "Global", 0.3), ("tas", "Tropical", -0.4)]);
        let obj = TuningObjective::build(&two_parameters(), &sensitivity(), &bias, &unit_weights(), 0.1)
            .unwrap();
        let offsets = obj.offsets(&Array::from_slice(&[0.1, 0.2]));
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0].key, FluxKey::new("net_toa", "ALL", "Global"));
        assert_abs_diff_eq!(offsets[0].offset, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[1].offset, -0.4 + 0.05 + 0.2, epsilon = 1e-12);
    }
}
