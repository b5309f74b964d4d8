//! Tuned parameters.
//!
//! The order of a [`ParameterSet`] is the order of every change vector the
//! optimizer produces: entry `i` of a change vector always belongs to
//! `parameters.get(i)`.

use ect_core::{ensure, Error, Real, Result};
use ect_math::Array;
use indexmap::IndexMap;

/// One tunable model parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Value in the current experiment.
    pub current: Real,
    /// Value the deviation penalty pulls towards. Never zero.
    pub reference: Real,
    /// Largest allowed absolute change. Never negative.
    pub max_change: Real,
}

impl Parameter {
    /// Value after applying `change`.
    pub fn new_value(&self, change: Real) -> Real {
        self.current + change
    }

    /// Squared relative deviation of `current + change` from the reference.
    pub fn deviation_squared(&self, change: Real) -> Real {
        let d = (self.reference - self.new_value(change)) / self.reference;
        d * d
    }
}

/// Ordered, validated collection of tuned parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
    index: IndexMap<String, usize>,
}

impl ParameterSet {
    /// Build the set from current values (whose order is kept), reference
    /// values, and the fractional increment bounding each change.
    ///
    /// The maximum change of a parameter is `|current × increment|`.
    ///
    /// # Errors
    /// - [`Error::Precondition`] if there are no parameters or `increment`
    ///   is not positive.
    /// - [`Error::Configuration`] if a parameter has no reference value.
    /// - [`Error::DegenerateParameter`] if a current or reference value is
    ///   zero or not finite.
    pub fn build(
        current: &IndexMap<String, Real>,
        references: &IndexMap<String, Real>,
        increment: Real,
    ) -> Result<Self> {
        ensure!(!current.is_empty(), "no parameters to tune");
        ensure!(
            increment.is_finite() && increment > 0.0,
            "fractional increment must be positive, got {increment}"
        );

        let mut parameters = Vec::with_capacity(current.len());
        for (name, &value) in current {
            let reference = *references.get(name).ok_or_else(|| {
                Error::Configuration(format!("no reference value for parameter '{name}'"))
            })?;
            if !value.is_finite() || value == 0.0 {
                return Err(Error::DegenerateParameter {
                    parameter: name.clone(),
                    reason: format!("current value {value} makes the relative change undefined"),
                });
            }
            if !reference.is_finite() || reference == 0.0 {
                return Err(Error::DegenerateParameter {
                    parameter: name.clone(),
                    reason: format!("reference value {reference} makes the penalty undefined"),
                });
            }
            parameters.push(Parameter {
                name: name.clone(),
                current: value,
                reference,
                max_change: (value * increment).abs(),
            });
        }
        Ok(Self::from_parameters(parameters))
    }

    fn from_parameters(parameters: Vec<Parameter>) -> Self {
        let index = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self { parameters, index }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the set is empty. A built set never is.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameter at position `i`.
    pub fn get(&self, i: usize) -> Option<&Parameter> {
        self.parameters.get(i)
    }

    /// Position of `name` in the change vector.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Parameter called `name`.
    pub fn by_name(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).map(|i| &self.parameters[i])
    }

    /// Parameter names in change-vector order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// Iterate in change-vector order.
    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    /// Current values as an array.
    pub fn current_values(&self) -> Array {
        self.parameters.iter().map(|p| p.current).collect::<Vec<_>>().into()
    }

    /// Maximum allowed changes as an array.
    pub fn max_changes(&self) -> Array {
        self.parameters.iter().map(|p| p.max_change).collect::<Vec<_>>().into()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
