//! First-order solvers for long-only, budget-constrained portfolios.
//!
//! Every feasible set here is a "capped simplex": `sum(w) = 1` with
//! `min <= w_i <= max`. Projection onto it is exact (bisection on the shift
//! `tau` in `clamp(v - tau)`), which keeps the projected-gradient methods simple.

use crate::error::OptimizerError;
use ndarray::{Array1, Array2};

const BISECTION_STEPS: usize = 100;
const DYKSTRA_STEPS: usize = 200;
const BACKTRACKING_STEPS: usize = 60;
const ARMIJO: f64 = 1e-4;

/// Per-asset weight limits. Weights always sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl WeightBounds {
    /// Checks that `assets` weights within the bounds can sum to one.
    pub fn check(&self, assets: usize) -> Result<(), OptimizerError> {
        let n = assets as f64;
        if self.min > self.max || self.min * n > 1.0 + 1e-12 || self.max * n < 1.0 - 1e-12 {
            return Err(OptimizerError::InfeasibleBounds {
                min: self.min,
                max: self.max,
                assets,
            });
        }
        Ok(())
    }

    pub fn contains(&self, weights: &Array1<f64>, tolerance: f64) -> bool {
        (weights.sum() - 1.0).abs() <= tolerance
            && weights
                .iter()
                .all(|w| *w >= self.min - tolerance && *w <= self.max + tolerance)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    pub max_iterations: usize,
    pub tolerance: f64,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub weights: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Euclidean projection of `v` onto the capped simplex.
pub fn project_capped_simplex(v: &Array1<f64>, bounds: WeightBounds) -> Array1<f64> {
    let shifted_sum = |tau: f64| v.iter().map(|x| (x - tau).clamp(bounds.min, bounds.max)).sum::<f64>();

    // At `lo` every weight sits at `max`, at `hi` every weight sits at `min`.
    let mut lo = v.fold(f64::INFINITY, |a, &x| a.min(x)) - bounds.max;
    let mut hi = v.fold(f64::NEG_INFINITY, |a, &x| a.max(x)) - bounds.min;
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if shifted_sum(mid) > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= f64::EPSILON * (1.0 + lo.abs()) {
            break;
        }
    }
    let tau = 0.5 * (lo + hi);
    v.mapv(|x| (x - tau).clamp(bounds.min, bounds.max))
}

/// Projection onto the capped simplex intersected with `mu . w >= target`,
/// by Dykstra's alternating projections. The result lies exactly in the
/// capped simplex and within solver accuracy of the return floor.
pub fn project_with_return_floor(
    v: &Array1<f64>,
    mu: &Array1<f64>,
    target: f64,
    bounds: WeightBounds,
) -> Array1<f64> {
    let mu_norm_sq = mu.dot(mu);
    let mut x = v.clone();
    let mut p = Array1::<f64>::zeros(v.len());
    let mut q = Array1::<f64>::zeros(v.len());
    let mut y = project_capped_simplex(v, bounds);

    for _ in 0..DYKSTRA_STEPS {
        y = project_capped_simplex(&(&x + &p), bounds);
        p = &x + &p - &y;

        let z = &y + &q;
        let shortfall = target - mu.dot(&z);
        let next = if shortfall > 0.0 && mu_norm_sq > 0.0 {
            &z + &(mu * (shortfall / mu_norm_sq))
        } else {
            z.clone()
        };
        q = &z - &next;

        let change = max_abs_diff(&next, &x);
        x = next;
        if change < 1e-14 {
            break;
        }
    }
    y
}

/// Weights with the highest attainable expected return: every asset at its
/// minimum, the remaining budget poured into the best assets first.
pub fn max_return_weights(mu: &Array1<f64>, bounds: WeightBounds) -> Array1<f64> {
    let mut weights = Array1::from_elem(mu.len(), bounds.min);
    let mut remaining = 1.0 - bounds.min * mu.len() as f64;

    let mut order: Vec<usize> = (0..mu.len()).collect();
    order.sort_by(|a, b| mu[*b].total_cmp(&mu[*a]));
    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let add = remaining.min(bounds.max - bounds.min);
        weights[i] += add;
        remaining -= add;
    }
    weights
}

/// Minimises `w' cov w` by projected gradient descent.
pub fn min_variance(cov: &Array2<f64>, bounds: WeightBounds, settings: SolverSettings) -> Solution {
    let start = equal_weights(cov.nrows(), bounds);
    projected_descent(cov, start, settings, |v| project_capped_simplex(v, bounds))
}

/// Minimum variance with an expected return floor.
pub fn target_return(
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    target: f64,
    bounds: WeightBounds,
    settings: SolverSettings,
) -> Result<Solution, OptimizerError> {
    let best = max_return_weights(mu, bounds);
    let max = mu.dot(&best);
    if target > max + 1e-12 {
        return Err(OptimizerError::UnreachableTarget { target, max });
    }
    let project = |v: &Array1<f64>| project_with_return_floor(v, mu, target, bounds);
    let start = project(&equal_weights(mu.len(), bounds));
    Ok(projected_descent(cov, start, settings, project))
}

/// Maximises the Sharpe ratio by projected gradient ascent with Armijo
/// backtracking, starting from the best of `candidates`.
pub fn max_sharpe(
    mu: &Array1<f64>,
    cov: &Array2<f64>,
    risk_free_rate: f64,
    bounds: WeightBounds,
    settings: SolverSettings,
    candidates: &[Array1<f64>],
) -> Solution {
    let sharpe = |w: &Array1<f64>| {
        let variance = w.dot(&cov.dot(w));
        if variance > 0.0 {
            (mu.dot(w) - risk_free_rate) / variance.sqrt()
        } else {
            f64::NEG_INFINITY
        }
    };
    let gradient = |w: &Array1<f64>| {
        let cov_w = cov.dot(w);
        let variance = w.dot(&cov_w);
        let sd = variance.sqrt();
        let excess = mu.dot(w) - risk_free_rate;
        mu / sd - &(cov_w * (excess / (sd * variance)))
    };

    let mut weights = candidates
        .iter()
        .max_by(|a, b| sharpe(*a).total_cmp(&sharpe(*b)))
        .cloned()
        .unwrap_or_else(|| equal_weights(mu.len(), bounds));
    if !sharpe(&weights).is_finite() {
        return Solution {
            weights,
            iterations: 0,
            converged: false,
        };
    }

    let mut step = 1.0;
    for iteration in 1..=settings.max_iterations {
        let current = sharpe(&weights);
        let grad = gradient(&weights);

        let mut accepted = None;
        for _ in 0..BACKTRACKING_STEPS {
            let candidate = project_capped_simplex(&(&weights + &(&grad * step)), bounds);
            let gain = grad.dot(&(&candidate - &weights));
            if sharpe(&candidate) >= current + ARMIJO * gain {
                accepted = Some(candidate);
                break;
            }
            step *= 0.5;
        }

        // No ascent direction left within the feasible set.
        let Some(candidate) = accepted else {
            return Solution {
                weights,
                iterations: iteration,
                converged: true,
            };
        };
        let change = max_abs_diff(&candidate, &weights);
        weights = candidate;
        if change < settings.tolerance {
            return Solution {
                weights,
                iterations: iteration,
                converged: true,
            };
        }
        step = (step * 2.0).min(1e6);
    }

    Solution {
        weights,
        iterations: settings.max_iterations,
        converged: false,
    }
}

/// Equal risk contributions `w_i (cov w)_i` via cyclical coordinate descent on
/// `0.5 w' cov w - (1/n) sum(ln w_i)`, normalised to sum to one and then
/// projected onto the bounds.
///
/// Every diagonal entry of `cov` must be positive.
pub fn risk_parity(cov: &Array2<f64>, bounds: WeightBounds, settings: SolverSettings) -> Solution {
    let n = cov.nrows();
    let budget = 1.0 / n as f64;
    let mut x = Array1::from_elem(n, budget);

    let mut iterations = settings.max_iterations;
    let mut converged = false;
    for iteration in 1..=settings.max_iterations {
        let mut change: f64 = 0.0;
        for i in 0..n {
            let a = cov[[i, i]];
            let c = cov.row(i).dot(&x) - a * x[i];
            // Positive root of a x^2 + c x - budget = 0
            let updated = (-c + (c * c + 4.0 * a * budget).sqrt()) / (2.0 * a);
            change = change.max((updated - x[i]).abs());
            x[i] = updated;
        }
        if change / x.sum() < settings.tolerance {
            iterations = iteration;
            converged = true;
            break;
        }
    }

    let normalised = &x / x.sum();
    Solution {
        weights: project_capped_simplex(&normalised, bounds),
        iterations,
        converged,
    }
}

pub(crate) fn equal_weights(assets: usize, bounds: WeightBounds) -> Array1<f64> {
    project_capped_simplex(&Array1::from_elem(assets, 1.0 / assets as f64), bounds)
}

/// Projected gradient descent on `w' cov w` with step `1 / L`, where `L` is
/// twice the largest eigenvalue of `cov`.
fn projected_descent(
    cov: &Array2<f64>,
    start: Array1<f64>,
    settings: SolverSettings,
    project: impl Fn(&Array1<f64>) -> Array1<f64>,
) -> Solution {
    let lipschitz = 2.0 * largest_eigenvalue(cov);
    if lipschitz <= 0.0 {
        return Solution {
            weights: start,
            iterations: 0,
            converged: true,
        };
    }
    let step = 1.0 / lipschitz;

    let mut weights = start;
    for iteration in 1..=settings.max_iterations {
        let gradient = cov.dot(&weights) * 2.0;
        let next = project(&(&weights - &(gradient * step)));
        let change = max_abs_diff(&next, &weights);
        weights = next;
        if change < settings.tolerance {
            return Solution {
                weights,
                iterations: iteration,
                converged: true,
            };
        }
    }
    Solution {
        weights,
        iterations: settings.max_iterations,
        converged: false,
    }
}

/// Power iteration for the dominant eigenvalue of a symmetric PSD matrix.
fn largest_eigenvalue(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    let mut x = Array1::from_elem(n, 1.0 / (n as f64).sqrt());
    let mut eigenvalue = 0.0;
    for _ in 0..200 {
        let y = matrix.dot(&x);
        let norm = y.dot(&y).sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        let estimate = x.dot(&y);
        x = y / norm;
        if (estimate - eigenvalue).abs() <= 1e-12 * estimate.abs() {
            return estimate;
        }
        eigenvalue = estimate;
    }
    eigenvalue
}

fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc.max((x - y).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const LONG_ONLY: WeightBounds = WeightBounds { min: 0.0, max: 1.0 };
    const SETTINGS: SolverSettings = SolverSettings {
        max_iterations: 20_000,
        tolerance: 1e-12,
    };

    fn assert_weights(actual: &Array1<f64>, expected: &[f64]) {
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = 1e-6);
        }
    }

    #[test]
    fn projection_onto_simplex() {
        assert_weights(&project_capped_simplex(&array![0.5, 0.5, 0.5], LONG_ONLY), &[1.0 / 3.0; 3]);
        assert_weights(&project_capped_simplex(&array![2.0, 0.0, 0.0], LONG_ONLY), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn projection_respects_caps() {
        let capped = WeightBounds { min: 0.0, max: 0.5 };
        assert_weights(&project_capped_simplex(&array![2.0, 0.0, 0.0], capped), &[0.5, 0.25, 0.25]);
    }

    #[test]
    fn infeasible_bounds_are_detected() {
        assert!(WeightBounds { min: 0.0, max: 0.3 }.check(3).is_err());
        assert!(WeightBounds { min: 0.4, max: 1.0 }.check(3).is_err());
        assert!(WeightBounds { min: 0.1, max: 0.5 }.check(3).is_ok());
    }

    #[test]
    fn min_variance_weights_by_inverse_variance() {
        let cov = array![[0.04, 0.0], [0.0, 0.01]];
        let solution = min_variance(&cov, LONG_ONLY, SETTINGS);
        assert!(solution.converged);
        assert_weights(&solution.weights, &[0.2, 0.8]);
    }

    #[test]
    fn max_sharpe_matches_tangency_portfolio() {
        // Uncorrelated assets with rf = 0: w is proportional to mu / sigma^2
        let mu = array![0.2, 0.1];
        let cov = array![[0.04, 0.0], [0.0, 0.01]];
        let start = min_variance(&cov, LONG_ONLY, SETTINGS).weights;
        let solution = max_sharpe(&mu, &cov, 0.0, LONG_ONLY, SETTINGS, &[start]);
        assert_weights(&solution.weights, &[1.0 / 3.0, 2.0 / 3.0]);
    }

    #[test]
    fn target_return_binds_when_above_min_variance_return() {
        let mu = array![0.1, 0.2];
        let cov = array![[0.01, 0.0], [0.0, 0.04]];
        // min variance is [0.8, 0.2] with return 0.12
        let solution = target_return(&mu, &cov, 0.15, LONG_ONLY, SETTINGS).unwrap();
        assert_weights(&solution.weights, &[0.5, 0.5]);

        let slack = target_return(&mu, &cov, 0.11, LONG_ONLY, SETTINGS).unwrap();
        assert_weights(&slack.weights, &[0.8, 0.2]);
    }

    #[test]
    fn unreachable_target_is_an_error() {
        let mu = array![0.1, 0.2];
        let cov = array![[0.01, 0.0], [0.0, 0.04]];
        assert!(matches!(
            target_return(&mu, &cov, 0.25, LONG_ONLY, SETTINGS),
            Err(OptimizerError::UnreachableTarget { .. })
        ));
    }

    #[test]
    fn max_return_fills_best_assets_first() {
        let bounds = WeightBounds { min: 0.1, max: 0.6 };
        let weights = max_return_weights(&array![0.05, 0.3, 0.1], bounds);
        assert_weights(&weights, &[0.1, 0.6, 0.3]);
    }

    #[test]
    fn risk_parity_equalises_contributions() {
        let cov = array![[0.04, 0.006], [0.006, 0.01]];
        let solution = risk_parity(&cov, LONG_ONLY, SETTINGS);
        let w = &solution.weights;
        let contributions = w * &cov.dot(w);
        assert_abs_diff_eq!(contributions[0], contributions[1], epsilon = 1e-9);
        assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn risk_parity_of_uncorrelated_assets_is_inverse_volatility() {
        let cov = array![[0.04, 0.0], [0.0, 0.01]];
        let solution = risk_parity(&cov, LONG_ONLY, SETTINGS);
        assert_weights(&solution.weights, &[1.0 / 3.0, 2.0 / 3.0]);
    }
}
