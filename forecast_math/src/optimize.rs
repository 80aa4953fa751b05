//! Derivative-free minimisation
//!
//! A plain Nelder-Mead simplex search. Everything about it is fixed by the
//! config (start point, initial simplex, coefficients), so two runs on the same
//! objective visit exactly the same points.

use crate::{MathError, Result};
use std::cmp::Ordering;

/// Settings for [`nelder_mead`]
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations
    pub max_iter: usize,
    /// Relative spread of objective values at which the search stops
    pub tolerance: f64,
    /// Simplex diameter at which the search stops
    pub point_tolerance: f64,
    /// Offset of the initial vertices from the start point
    pub initial_step: f64,
    /// Reflection coefficient
    pub reflection: f64,
    /// Expansion coefficient
    pub expansion: f64,
    /// Contraction coefficient
    pub contraction: f64,
    /// Shrink coefficient
    pub shrink: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            tolerance: 1e-10,
            point_tolerance: 1e-10,
            initial_step: 0.1,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations used
    pub iterations: usize,
    /// Whether a stopping tolerance was met before `max_iter`
    pub converged: bool,
}

/// Minimise `objective` starting from `start`.
///
/// Non-finite objective values are treated as `+inf`, so regions where the
/// objective blows up are simply avoided.
pub fn nelder_mead<F>(objective: F, start: &[f64], config: &NelderMeadConfig) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    if start.is_empty() {
        return Err(MathError::InvalidInput(
            "Nelder-Mead needs at least one parameter".to_string(),
        ));
    }
    if config.initial_step == 0.0 {
        return Err(MathError::InvalidInput(
            "Initial simplex step must be non-zero".to_string(),
        ));
    }

    let evaluate = |x: &[f64]| {
        let value = objective(x);
        if value.is_finite() {
            value
        } else {
            f64::INFINITY
        }
    };

    let n = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.to_vec(), evaluate(start)));
    for i in 0..n {
        let mut vertex = start.to_vec();
        vertex[i] += config.initial_step;
        let value = evaluate(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        if has_converged(&simplex, config) {
            converged = true;
            break;
        }
        iterations += 1;

        let best = simplex[0].1;
        let second_worst = simplex[n - 1].1;
        let worst = simplex[n].1;

        let mut centroid = vec![0.0; n];
        for (vertex, _) in &simplex[..n] {
            for (c, &x) in centroid.iter_mut().zip(vertex) {
                *c += x / n as f64;
            }
        }

        let reflected = towards(&centroid, &simplex[n].0, -config.reflection);
        let reflected_value = evaluate(&reflected);

        if reflected_value < best {
            let expanded = towards(&centroid, &reflected, config.expansion);
            let expanded_value = evaluate(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < second_worst {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < worst {
            let point = towards(&centroid, &reflected, config.contraction);
            let value = evaluate(&point);
            (point, value)
        } else {
            let point = towards(&centroid, &simplex[n].0, config.contraction);
            let value = evaluate(&point);
            (point, value)
        };

        if contracted_value < reflected_value.min(worst) {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for vertex in simplex.iter_mut().skip(1) {
            let shrunk = towards(&anchor, &vertex.0, config.shrink);
            let value = evaluate(&shrunk);
            *vertex = (shrunk, value);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let (point, value) = simplex.swap_remove(0);

    Ok(NelderMeadResult {
        point,
        value,
        iterations,
        converged,
    })
}

/// `origin + factor * (target - origin)`
fn towards(origin: &[f64], target: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(&o, &t)| o + factor * (t - o))
        .collect()
}

fn has_converged(sorted: &[(Vec<f64>, f64)], config: &NelderMeadConfig) -> bool {
    let best = sorted[0].1;
    let worst = sorted[sorted.len() - 1].1;
    if !best.is_finite() || !worst.is_finite() {
        return false;
    }

    if (worst - best).abs() <= config.tolerance * (best.abs() + config.tolerance) {
        return true;
    }

    let anchor = &sorted[0].0;
    let diameter = sorted[1..]
        .iter()
        .flat_map(|(vertex, _)| vertex.iter().zip(anchor).map(|(&x, &a)| (x - a).abs()))
        .fold(0.0_f64, f64::max);
    diameter <= config.point_tolerance
}
