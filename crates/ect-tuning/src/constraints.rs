//! Bounds on parameter changes.

use crate::parameters::ParameterSet;
use ect_core::Real;
use ect_math::optimization::Constraint;
use ect_math::Array;

/// `|x_i| <= max_change_i` for every parameter, as one inequality each.
///
/// The solver sees `max_change_i - |x_i|`; zero means the change sits
/// exactly on its bound, which is still feasible.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxChangeConstraint {
    max_change: Array,
}

impl MaxChangeConstraint {
    /// Bounds taken from each parameter's `max_change`.
    pub fn new(parameters: &ParameterSet) -> Self {
        Self {
            max_change: parameters.max_changes(),
        }
    }

    /// Bounds given directly, in change-vector order.
    pub fn from_bounds(max_change: Array) -> Self {
        Self { max_change }
    }

    /// Inequality value for parameter `i` alone.
    pub fn margin(&self, i: usize, changes: &Array) -> Real {
        self.max_change[i] - changes[i].abs()
    }

    /// The bounds.
    pub fn bounds(&self) -> &Array {
        &self.max_change
    }
}

impl Constraint for MaxChangeConstraint {
    fn values(&self, x: &Array) -> Array {
        (0..self.max_change.size())
            .map(|i| self.margin(i, x))
            .collect::<Vec<_>>()
            .into()
    }

    /// Clamp each change onto `[-max_change_i, max_change_i]`.
    fn project(&self, x: &Array) -> Array {
        x.iter()
            .zip(self.max_change.iter())
            .map(|(&v, &bound)| v.clamp(-bound, bound))
            .collect::<Vec<_>>()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint() -> MaxChangeConstraint {
        MaxChangeConstraint::from_bounds(Array::from_slice(&[0.5, 2.0]))
    }

    #[test]
    fn one_inequality_per_parameter() {
        let g = constraint().values(&Array::from_slice(&[0.25, -3.0]));
        assert_eq!(g.as_slice(), &[0.25, -1.0]);
    }

    #[test]
    fn boundary_is_exactly_zero_and_feasible() {
        let c = constraint();
        let x = Array::from_slice(&[-0.5, 2.0]);
        assert_eq!(c.margin(0, &x), 0.0);
        assert_eq!(c.margin(1, &x), 0.0);
        assert!(c.test(&x));
    }

    #[test]
    fn outside_either_bound_is_infeasible() {
        let c = constraint();
        assert!(!c.test(&Array::from_slice(&[0.51, 0.0])));
        assert!(!c.test(&Array::from_slice(&[0.0, -2.01])));
        assert!(c.test(&Array::zeros(2)));
    }

    #[test]
    fn projection_clamps_onto_bounds() {
        let c = constraint();
        let p = c.project(&Array::from_slice(&[0.75, -1.5]));
        assert_eq!(p.as_slice(), &[0.5, -1.5]);
        let p = c.project(&Array::from_slice(&[-3.0, 2.5]));
        assert_eq!(p.as_slice(), &[-0.5, 2.0]);
        assert!(c.test(&p));
    }
}
