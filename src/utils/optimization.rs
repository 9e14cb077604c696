//! Derivative-free optimization for ARIMA parameter estimation.
//!
//! The conditional-sum-of-squares objective is cheap to evaluate but has
//! no closed-form gradient, so parameters are estimated with a bounded
//! Nelder-Mead simplex search.

/// Configuration for the simplex search.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the objective spread across the simplex.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub reflect: f64,
    /// Expansion coefficient.
    pub expand: f64,
    /// Contraction coefficient.
    pub contract: f64,
    /// Shrink coefficient.
    pub shrink: f64,
    /// Relative step used to seed the initial simplex.
    pub initial_step: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-8,
            reflect: 1.0,
            expand: 2.0,
            contract: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a simplex minimization.
#[derive(Debug, Clone)]
pub struct SimplexOutcome {
    /// Best point found.
    pub point: Vec<f64>,
    /// Objective value at the best point.
    pub value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the objective spread fell below tolerance.
    pub converged: bool,
}

/// Minimize `objective` starting from `start`, optionally constrained to
/// per-dimension `(min, max)` bounds.
pub fn minimize<F>(
    objective: F,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    opts: SimplexOptions,
) -> SimplexOutcome
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    if n == 0 {
        return SimplexOutcome {
            point: vec![],
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    // Seed the simplex with the start point and one perturbed vertex per
    // dimension.
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let start_clamped = clamp_point(start, bounds);
    let start_value = objective(&start_clamped);
    simplex.push((start_clamped.clone(), start_value));

    for i in 0..n {
        let mut vertex = start_clamped.clone();
        let step = if vertex[i].abs() > 1e-10 {
            opts.initial_step * vertex[i].abs()
        } else {
            opts.initial_step
        };
        vertex[i] += step;
        let vertex = clamp_point(&vertex, bounds);
        let value = objective(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iter {
        iterations += 1;

        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let spread = simplex[n].1 - simplex[0].1;
        if spread.abs() < opts.tolerance {
            converged = true;
            break;
        }

        // Centroid of all vertices except the worst.
        let mut centroid = vec![0.0; n];
        for (vertex, _) in simplex.iter().take(n) {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
        for c in &mut centroid {
            *c /= n as f64;
        }

        let worst = simplex[n].clone();
        let reflected = move_point(&centroid, &worst.0, opts.reflect, bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < simplex[0].1 {
            // Reflected point is the new best: try to expand further.
            let expanded = move_point(&centroid, &worst.0, opts.reflect * opts.expand, bounds);
            let expanded_value = objective(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        // Contraction: outside if reflection improved on the worst,
        // inside otherwise.
        let contracted = if reflected_value < worst.1 {
            move_point(&centroid, &worst.0, opts.reflect * opts.contract, bounds)
        } else {
            move_point(&centroid, &worst.0, -opts.contract, bounds)
        };
        let contracted_value = objective(&contracted);
        let accept_threshold = reflected_value.min(worst.1);

        if contracted_value <= accept_threshold {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        // Shrink every vertex toward the best.
        let best = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            for (v, b) in vertex.iter_mut().zip(&best) {
                *v = b + opts.shrink * (*v - b);
            }
            *vertex = clamp_point(vertex, bounds);
            *value = objective(vertex);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (point, value) = simplex.swap_remove(0);

    SimplexOutcome {
        point,
        value,
        iterations,
        converged,
    }
}

/// `centroid + coefficient * (centroid - from)`, clamped to bounds.
fn move_point(
    centroid: &[f64],
    from: &[f64],
    coefficient: f64,
    bounds: Option<&[(f64, f64)]>,
) -> Vec<f64> {
    let point: Vec<f64> = centroid
        .iter()
        .zip(from)
        .map(|(c, p)| c + coefficient * (c - p))
        .collect();
    clamp_point(&point, bounds)
}

fn clamp_point(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quadratic_2d() {
        let outcome = minimize(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            SimplexOptions::default(),
        );

        assert!(outcome.converged);
        assert_relative_eq!(outcome.point[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.point[1], 3.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.value, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn rosenbrock() {
        let opts = SimplexOptions {
            max_iter: 5000,
            tolerance: 1e-10,
            ..Default::default()
        };
        let outcome = minimize(
            |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2),
            &[0.0, 0.0],
            None,
            opts,
        );

        assert_relative_eq!(outcome.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(outcome.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn respects_bounds() {
        // Unconstrained minimum at x = 5, feasible region ends at 3.
        let outcome = minimize(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            SimplexOptions::default(),
        );

        assert_relative_eq!(outcome.point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn starts_at_optimum() {
        let outcome = minimize(
            |x| (x[0] - 2.0).powi(2),
            &[2.0],
            None,
            SimplexOptions::default(),
        );

        assert!(outcome.converged);
        assert_relative_eq!(outcome.point[0], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn empty_start_does_not_panic() {
        let outcome = minimize(|_| 0.0, &[], None, SimplexOptions::default());
        assert!(!outcome.converged);
        assert!(outcome.value.is_nan());
    }

    #[test]
    fn css_like_objective() {
        // One-parameter smoothing objective of the shape the ARIMA
        // fitter produces: optimum strictly inside the bounds.
        let data = [10.0, 12.0, 11.0, 13.0, 14.0, 13.0, 15.0, 16.0];
        let sse = |params: &[f64]| {
            let alpha = params[0];
            let mut level = data[0];
            let mut total = 0.0;
            for &y in &data[1..] {
                let error = y - level;
                total += error * error;
                level = alpha * y + (1.0 - alpha) * level;
            }
            total
        };

        let outcome = minimize(sse, &[0.5], Some(&[(0.01, 0.99)]), SimplexOptions::default());
        assert!(outcome.converged);
        assert!(outcome.point[0] > 0.01 && outcome.point[0] < 0.99);
    }
}
