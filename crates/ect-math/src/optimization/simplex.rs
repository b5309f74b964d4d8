//! Nelder–Mead simplex minimizer with inequality constraints.

use super::{Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationResult};
use crate::array::Array;
use ect_core::{ensure, fail, Error, Real, Result};

/// Halvings tried when an initial simplex step leaves the feasible region.
const MAX_STEP_HALVINGS: usize = 60;

/// Per-dimension size of the initial simplex.
#[derive(Debug, Clone)]
enum Steps {
    Uniform(Real),
    PerDimension(Array),
}

/// Nelder–Mead simplex optimizer.
///
/// Derivative-free, so it only ever needs cost values. Trial points are
/// first passed through [`Constraint::project`], which lets the simplex
/// slide along box bounds; a point that still fails [`Constraint::test`]
/// is treated as infinitely bad and never enters the simplex. The best vertex
/// is only ever replaced by a strictly better one, so the returned point
/// never scores worse than the starting point.
#[derive(Debug, Clone)]
pub struct Simplex {
    steps: Steps,
}

impl Simplex {
    /// Create a simplex optimizer with the same initial step `lambda` along
    /// every axis.
    pub fn new(lambda: Real) -> Self {
        Self {
            steps: Steps::Uniform(lambda),
        }
    }

    /// Create a simplex optimizer with one initial step per axis.
    pub fn with_steps(steps: Array) -> Self {
        Self {
            steps: Steps::PerDimension(steps),
        }
    }

    fn step(&self, i: usize) -> Real {
        match &self.steps {
            Steps::Uniform(lambda) => *lambda,
            Steps::PerDimension(steps) => steps[i],
        }
    }

    /// Minimize `cost_fn` subject to `constraint`, starting from
    /// `initial_values`.
    ///
    /// The start point must be feasible. Running out of iterations is not an
    /// error; the best vertex is returned with
    /// [`EndCriteriaType::MaxIterations`].
    pub fn minimize<C: CostFunction, K: Constraint>(
        &self,
        cost_fn: &C,
        constraint: &K,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        let n = initial_values.size();
        ensure!(n > 0, "cannot minimize over an empty vector");
        ensure!(
            end_criteria.max_iterations > 0,
            "max_iterations must be positive"
        );
        if let Steps::PerDimension(steps) = &self.steps {
            ensure!(
                steps.size() == n,
                "expected {n} initial steps, got {}",
                steps.size()
            );
        }
        ensure!(
            constraint.test(initial_values),
            "initial point {initial_values} violates the constraints"
        );

        let evaluate = |x: &Array| -> Real {
            if !constraint.test(x) {
                return Real::INFINITY;
            }
            let v = cost_fn.value(x);
            if v.is_nan() {
                Real::INFINITY
            } else {
                v
            }
        };

        let mut vertices = self.initial_simplex(constraint, initial_values)?;
        let mut values: Vec<Real> = vertices.iter().map(&evaluate).collect();
        let np1 = vertices.len();

        let mut iterations = 0;
        let mut stationary_count = 0;
        let mut prev_best = values[0];

        loop {
            let (ilo, ihi, inhi) = rank(&values);

            iterations += 1;
            if values[ilo] < end_criteria.root_epsilon {
                return Ok(finish(&vertices, &values, ilo, iterations, EndCriteriaType::RootEpsilon));
            }
            let spread = 2.0 * (values[ihi] - values[ilo]).abs();
            let scale = values[ihi].abs() + values[ilo].abs() + Real::MIN_POSITIVE;
            if values[ihi].is_finite() && spread <= end_criteria.function_epsilon * scale {
                return Ok(finish(&vertices, &values, ilo, iterations, EndCriteriaType::FunctionEpsilon));
            }
            if (prev_best - values[ilo]).abs() < end_criteria.function_epsilon {
                stationary_count += 1;
                if stationary_count >= end_criteria.max_stationary_state_iterations {
                    return Ok(finish(&vertices, &values, ilo, iterations, EndCriteriaType::StationaryPoint));
                }
            } else {
                stationary_count = 0;
            }
            prev_best = values[ilo];

            if iterations >= end_criteria.max_iterations {
                return Ok(finish(&vertices, &values, ilo, iterations, EndCriteriaType::MaxIterations));
            }

            // Centroid of every vertex but the worst
            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != ihi {
                    centroid = &centroid + v;
                }
            }
            let centroid = &centroid / n as Real;

            let reflected = constraint.project(&(&(&centroid * 2.0) - &vertices[ihi]));
            let fr = evaluate(&reflected);

            if fr < values[ilo] {
                let expanded = constraint.project(&(&(&reflected * 2.0) - &centroid));
                let fe = evaluate(&expanded);
                if fe < fr {
                    vertices[ihi] = expanded;
                    values[ihi] = fe;
                } else {
                    vertices[ihi] = reflected;
                    values[ihi] = fr;
                }
            } else if fr < values[inhi] {
                vertices[ihi] = reflected;
                values[ihi] = fr;
            } else {
                let contracted = constraint.project(&if fr < values[ihi] {
                    &(&centroid + &reflected) / 2.0
                } else {
                    &(&centroid + &vertices[ihi]) / 2.0
                });
                let fc = evaluate(&contracted);
                if fc < values[ihi].min(fr) {
                    vertices[ihi] = contracted;
                    values[ihi] = fc;
                } else {
                    for i in 0..np1 {
                        if i != ilo {
                            vertices[i] = &(&vertices[ilo] + &vertices[i]) / 2.0;
                            values[i] = evaluate(&vertices[i]);
                        }
                    }
                }
            }
        }
    }

    /// Start point plus one feasible vertex per axis.
    fn initial_simplex<K: Constraint>(&self, constraint: &K, start: &Array) -> Result<Vec<Array>> {
        let n = start.size();
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(start.clone());
        for i in 0..n {
            let mut step = self.step(i);
            if !(step.is_finite() && step > 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "initial step along axis {i} must be positive, got {step}"
                )));
            }
            let mut vertex = None;
            for _ in 0..MAX_STEP_HALVINGS {
                let mut up = start.clone();
                up[i] += step;
                if constraint.test(&up) {
                    vertex = Some(up);
                    break;
                }
                let mut down = start.clone();
                down[i] -= step;
                if constraint.test(&down) {
                    vertex = Some(down);
                    break;
                }
                step *= 0.5;
            }
            match vertex {
                Some(v) => vertices.push(v),
                None => fail!("no feasible initial step along axis {i}"),
            }
        }
        Ok(vertices)
    }
}

/// Indices of the best, worst, and second-worst vertices.
fn rank(values: &[Real]) -> (usize, usize, usize) {
    let mut ilo = 0;
    let mut ihi = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[ilo] {
            ilo = i;
        }
        if v > values[ihi] {
            ihi = i;
        }
    }
    if ihi == ilo && values.len() > 1 {
        // all equal
        ihi = if ilo == 0 { 1 } else { 0 };
    }
    let mut inhi = ilo;
    for (i, &v) in values.iter().enumerate() {
        if i != ihi && v > values[inhi] {
            inhi = i;
        }
    }
    (ilo, ihi, inhi)
}

fn finish(
    vertices: &[Array],
    values: &[Real],
    best: usize,
    iterations: usize,
    end_type: EndCriteriaType,
) -> OptimizationResult {
    tracing::debug!(
        iterations,
        value = values[best],
        end = %end_type,
        "simplex finished"
    );
    OptimizationResult {
        x: vertices[best].clone(),
        value: values[best],
        iterations,
        end_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::NoConstraint;
    use approx::assert_abs_diff_eq;

    /// f(x) = (x-3)²
    struct SimpleQuadratic;
    impl CostFunction for SimpleQuadratic {
        fn value(&self, x: &Array) -> Real {
            (x[0] - 3.0).powi(2)
        }
    }

    /// f(x, y) = (1-x)² + 100(y-x²)²
    struct Rosenbrock;
    impl CostFunction for Rosenbrock {
        fn value(&self, x: &Array) -> Real {
            (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
        }
    }

    /// |x_i| <= bound_i
    struct Bounds(Vec<Real>);
    impl Constraint for Bounds {
        fn values(&self, x: &Array) -> Array {
            Array::from_vec(
                self.0
                    .iter()
                    .zip(x.iter())
                    .map(|(b, v)| b - v.abs())
                    .collect(),
            )
        }

        fn project(&self, x: &Array) -> Array {
            Array::from_vec(
                self.0
                    .iter()
                    .zip(x.iter())
                    .map(|(&b, &v)| v.clamp(-b, b))
                    .collect(),
            )
        }
    }

    /// Bounds without projection: infeasible points are only rejected.
    struct RejectingBounds(Vec<Real>);
    impl Constraint for RejectingBounds {
        fn values(&self, x: &Array) -> Array {
            Bounds(self.0.clone()).values(x)
        }
    }

    /// f(x, y) = (x-3)² + (y+3)², minimized over the unit box at (1, -1).
    struct OutsideCorner;
    impl CostFunction for OutsideCorner {
        fn value(&self, x: &Array) -> Real {
            (x[0] - 3.0).powi(2) + (x[1] + 3.0).powi(2)
        }
    }

    /// Disk of radius 1 centred at the origin.
    struct UnitDisk;
    impl Constraint for UnitDisk {
        fn values(&self, x: &Array) -> Array {
            Array::from_slice(&[1.0 - x.dot(x)])
        }
    }

    #[test]
    fn unconstrained_quadratic() {
        let ec = EndCriteria::new(1000, 100, 1e-14, 1e-14);
        let result = Simplex::new(0.5)
            .minimize(&SimpleQuadratic, &NoConstraint, &Array::zeros(1), &ec)
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 3.0, epsilon = 1e-4);
        assert!(result.end_type.is_converged());
    }

    #[test]
    fn rosenbrock() {
        let ec = EndCriteria::new(5000, 500, 1e-14, 1e-16);
        let result = Simplex::new(0.5)
            .minimize(&Rosenbrock, &NoConstraint, &Array::from_slice(&[-1.0, 1.0]), &ec)
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 0.05);
        assert_abs_diff_eq!(result.x[1], 1.0, epsilon = 0.1);
    }

    #[test]
    fn active_bound_stops_at_boundary() {
        let ec = EndCriteria::new(1000, 100, 1e-14, 1e-14);
        let result = Simplex::with_steps(Array::from_slice(&[0.5]))
            .minimize(&SimpleQuadratic, &Bounds(vec![1.0]), &Array::zeros(1), &ec)
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-6);
        assert!(result.x[0] <= 1.0);
    }

    #[test]
    fn nonlinear_constraint_respected() {
        let ec = EndCriteria::new(2000, 200, 1e-14, 1e-14);
        let result = Simplex::new(0.25)
            .minimize(&Rosenbrock, &UnitDisk, &Array::zeros(2), &ec)
            .unwrap();
        assert!(result.x.dot(&result.x) <= 1.0);
        assert!(result.value < 0.5 * Rosenbrock.value(&Array::zeros(2)));
    }

    #[test]
    fn oversized_step_is_shrunk_to_fit() {
        let ec = EndCriteria::new(1000, 100, 1e-14, 1e-14);
        let result = Simplex::new(10.0)
            .minimize(&SimpleQuadratic, &Bounds(vec![0.1]), &Array::zeros(1), &ec)
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn iteration_limit_returns_best_so_far() {
        let ec = EndCriteria::new(3, 100, 1e-14, 1e-14);
        let start = Array::from_slice(&[-1.0, 1.0]);
        let result = Simplex::new(0.5)
            .minimize(&Rosenbrock, &NoConstraint, &start, &ec)
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::MaxIterations);
        assert_eq!(result.iterations, 3);
        assert!(result.value <= Rosenbrock.value(&start));
    }

    #[test]
    fn projection_reaches_box_corner() {
        let ec = EndCriteria::default();
        let result = Simplex::new(0.5)
            .minimize(&OutsideCorner, &Bounds(vec![1.0, 1.0]), &Array::zeros(2), &ec)
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.x[1], -1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.value, 8.0, epsilon = 1e-9);
        assert!(result.end_type.is_converged());
    }

    #[test]
    fn rejection_only_stays_feasible() {
        let ec = EndCriteria::default();
        let start = Array::zeros(2);
        let result = Simplex::new(0.5)
            .minimize(&OutsideCorner, &RejectingBounds(vec![1.0, 1.0]), &start, &ec)
            .unwrap();
        assert!(RejectingBounds(vec![1.0, 1.0]).test(&result.x));
        assert!(result.value < OutsideCorner.value(&start));
    }

    #[test]
    fn infeasible_start_is_rejected() {
        let ec = EndCriteria::default();
        let err = Simplex::new(0.1)
            .minimize(&SimpleQuadratic, &Bounds(vec![1.0]), &Array::from_slice(&[2.0]), &ec)
            .unwrap_err();
        assert!(matches!(err, ect_core::Error::Precondition(_)));
    }

    #[test]
    fn non_positive_step_is_invalid() {
        let ec = EndCriteria::default();
        let err = Simplex::new(0.0)
            .minimize(&SimpleQuadratic, &NoConstraint, &Array::from_slice(&[1.0]), &ec)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn step_count_must_match_dimension() {
        let ec = EndCriteria::default();
        let result = Simplex::with_steps(Array::from_slice(&[0.1, 0.1])).minimize(
            &SimpleQuadratic,
            &NoConstraint,
            &Array::zeros(1),
            &ec,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rank_orders_vertices() {
        assert_eq!(rank(&[3.0, 1.0, 2.0]), (1, 0, 2));
        let (lo, hi, _) = rank(&[1.0, 1.0]);
        assert_ne!(lo, hi);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_worse_than_start(
                target in -5.0f64..5.0,
                bound in 0.01f64..2.0,
                max_iterations in 1usize..50,
            ) {
                struct Shifted(Real);
                impl CostFunction for Shifted {
                    fn value(&self, x: &Array) -> Real {
                        (x[0] - self.0).powi(2)
                    }
                }
                let cost = Shifted(target);
                let ec = EndCriteria::new(max_iterations, 100, 1e-14, 1e-14);
                let start = Array::zeros(1);
                let result = Simplex::new(bound / 2.0)
                    .minimize(&cost, &Bounds(vec![bound]), &start, &ec)
                    .unwrap();
                prop_assert!(result.value <= cost.value(&start));
                prop_assert!(result.x[0].abs() <= bound);
            }
        }
    }
}
