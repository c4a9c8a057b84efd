//! Derivative-free minimisation with the Nelder-Mead simplex method

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of a Nelder-Mead search
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance
    pub converged: bool,
}

/// Nelder-Mead tuning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance on the spread of objective values
    pub tolerance: f64,
    /// Initial simplex step, relative to each coordinate
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimise `objective` starting from `initial`
///
/// Points are clamped into `bounds` (one `(min, max)` pair per coordinate)
/// whenever they are generated. Non-finite objective values are treated as
/// worse than any finite value.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |p: &[f64]| {
        let v = objective(p);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        return Minimum {
            point: Vec::new(),
            value: eval(initial),
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial, bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(clamp(&vertex, bounds));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(Ordering::Equal)
        });
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        let threshold = config.tolerance * (values[best].abs() + config.tolerance);
        if spread.is_finite() && spread <= threshold {
            converged = true;
            break;
        }

        let centroid = centroid(&simplex, worst);
        let reflected = clamp(&towards(&centroid, &simplex[worst], -REFLECTION), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(&towards(&centroid, &reflected, EXPANSION), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (candidate, candidate_value) = if reflected_value < values[worst] {
            let outside = clamp(&towards(&centroid, &reflected, CONTRACTION), bounds);
            let value = eval(&outside);
            (outside, value)
        } else {
            let inside = clamp(&towards(&centroid, &simplex[worst], CONTRACTION), bounds);
            let value = eval(&inside);
            (inside, value)
        };

        if candidate_value < values[worst].min(reflected_value) {
            simplex[worst] = candidate;
            values[worst] = candidate_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                let shrunk = towards(&anchor, &simplex[i], SHRINK);
                simplex[i] = clamp(&shrunk, bounds);
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

fn centroid(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut c = vec![0.0; dims];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (acc, x) in c.iter_mut().zip(vertex) {
                *acc += x;
            }
        }
    }
    c.iter_mut().for_each(|x| *x /= count);
    c
}

/// `origin + factor * (point - origin)`
fn towards(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn clamp(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
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
    fn test_quadratic_bowl() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2) + 0.5,
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], -1.0, epsilon = 1e-3);
        assert_relative_eq!(result.value, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_bounds_are_respected() {
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[0.0],
            Some(&[(-0.99, 0.99)]),
            NelderMeadConfig::default(),
        );

        assert!(result.point[0] <= 0.99);
        assert_relative_eq!(result.point[0], 0.99, epsilon = 1e-3);
    }

    #[test]
    fn test_non_finite_objective_is_avoided() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.value.is_finite());
        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_problem() {
        let result = nelder_mead(|_| 3.0, &[], None, NelderMeadConfig::default());
        assert!(result.point.is_empty());
        assert_relative_eq!(result.value, 3.0);
    }
}
