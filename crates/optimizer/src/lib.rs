//! # Portfolio Optimizer
//!
//! Mean-variance portfolio construction over a [`MarketModel`] estimated from
//! daily closes: maximum Sharpe, minimum variance, target return and risk
//! parity, plus a Monte Carlo cloud of random portfolios and the efficient
//! frontier.
//!
//! Weights are long-only and fully invested, with optional per-asset bounds
//! from the `[portfolio]` config section. All statistics are annualised with
//! `trading_days` periods per year.

use crate::error::OptimizerError;
use crate::solvers::{SolverSettings, WeightBounds};
use configuration::PortfolioSettings;
use core_types::OptimizationMethod;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

pub mod error;
pub mod model;
pub mod solvers;

pub use model::MarketModel;

/// Tolerance used when reporting whether a result honours its constraints.
const CONSTRAINT_TOLERANCE: f64 = 1e-6;

/// Expected return, volatility and Sharpe ratio of one weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub volatility: f64,
    /// `None` when the portfolio has zero volatility.
    pub sharpe_ratio: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub method: OptimizationMethod,
    pub symbols: Vec<String>,
    pub weights: Vec<f64>,
    pub metrics: PortfolioMetrics,
    pub constraints_satisfied: bool,
    pub iterations: usize,
    pub elapsed: Duration,
}

/// A single weighting and its metrics, as produced by the Monte Carlo search
/// and the efficient frontier.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioPoint {
    pub weights: Vec<f64>,
    pub metrics: PortfolioMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResult {
    pub symbols: Vec<String>,
    pub portfolios: Vec<PortfolioPoint>,
    /// Index into `portfolios` of the highest Sharpe ratio.
    pub best_sharpe: Option<usize>,
    /// Index into `portfolios` of the lowest volatility.
    pub min_volatility: Option<usize>,
}

/// Risk profile of a weighting over the historical window.
///
/// VaR, CVaR and drawdown are positive daily loss fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedMetrics {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: Option<f64>,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
    pub var_95: f64,
    pub cvar_95: f64,
    pub max_drawdown: f64,
}

pub struct PortfolioOptimizer {
    model: MarketModel,
    risk_free_rate: f64,
    bounds: WeightBounds,
    solver: SolverSettings,
}

impl PortfolioOptimizer {
    pub fn new(model: MarketModel, settings: &PortfolioSettings) -> Result<Self, OptimizerError> {
        let bounds = WeightBounds {
            min: settings.min_position_weight,
            max: settings.max_position_weight,
        };
        bounds.check(model.assets())?;
        Ok(Self {
            model,
            risk_free_rate: settings.risk_free_rate,
            bounds,
            solver: SolverSettings {
                max_iterations: settings.max_iterations,
                tolerance: settings.tolerance,
            },
        })
    }

    pub fn model(&self) -> &MarketModel {
        &self.model
    }

    pub fn portfolio_metrics(&self, weights: &Array1<f64>) -> PortfolioMetrics {
        let expected_return = self.model.portfolio_return(weights);
        let volatility = self.model.portfolio_variance(weights).max(0.0).sqrt();
        PortfolioMetrics {
            expected_return,
            volatility,
            sharpe_ratio: (volatility > 0.0).then(|| (expected_return - self.risk_free_rate) / volatility),
        }
    }

    #[instrument(skip(self), fields(method = %method))]
    pub fn optimize(&self, method: OptimizationMethod) -> Result<OptimizationResult, OptimizerError> {
        let started = Instant::now();
        let mu = self.model.expected_returns();
        let cov = self.model.covariance();

        let solution = match method {
            OptimizationMethod::MinVariance => solvers::min_variance(cov, self.bounds, self.solver),
            OptimizationMethod::MaxSharpe => {
                let candidates = [
                    solvers::equal_weights(mu.len(), self.bounds),
                    solvers::min_variance(cov, self.bounds, self.solver).weights,
                ];
                solvers::max_sharpe(mu, cov, self.risk_free_rate, self.bounds, self.solver, &candidates)
            }
            OptimizationMethod::TargetReturn(target) => {
                solvers::target_return(mu, cov, target, self.bounds, self.solver)?
            }
            OptimizationMethod::RiskParity => {
                if let Some(i) = (0..mu.len()).find(|i| cov[[*i, *i]] <= 0.0) {
                    return Err(OptimizerError::DegenerateAsset(self.model.symbols()[i].clone()));
                }
                solvers::risk_parity(cov, self.bounds, self.solver)
            }
        };

        if !solution.converged {
            warn!(iterations = solution.iterations, "Solver stopped before reaching tolerance");
        }

        let metrics = self.portfolio_metrics(&solution.weights);
        let mut constraints_satisfied = self.bounds.contains(&solution.weights, CONSTRAINT_TOLERANCE);
        if let OptimizationMethod::TargetReturn(target) = method {
            constraints_satisfied &= metrics.expected_return >= target - CONSTRAINT_TOLERANCE;
        }

        Ok(OptimizationResult {
            method,
            symbols: self.model.symbols().to_vec(),
            weights: solution.weights.to_vec(),
            metrics,
            constraints_satisfied,
            iterations: solution.iterations,
            elapsed: started.elapsed(),
        })
    }

    /// Runs max Sharpe, min variance and risk parity. A method that fails is
    /// logged and left out.
    pub fn compare_methods(&self) -> Vec<OptimizationResult> {
        OptimizationMethod::COMPARED
            .iter()
            .filter_map(|method| match self.optimize(*method) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(method = %method, error = %e, "Optimization failed");
                    None
                }
            })
            .collect()
    }

    /// Evaluates `simulations` random fully-invested portfolios in parallel.
    ///
    /// Weights are uniform draws normalised to sum to one, so position bounds
    /// do not apply. A fixed `seed` reproduces the same portfolios regardless
    /// of thread count.
    #[instrument(skip(self))]
    pub fn monte_carlo(&self, simulations: usize, seed: Option<u64>) -> MonteCarloResult {
        let mut master = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..simulations).map(|_| master.r#gen::<u64>()).collect();
        let assets = self.model.assets();

        let portfolios: Vec<PortfolioPoint> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let raw = Array1::from_shape_fn(assets, |_| rng.gen_range(0.0..1.0));
                let weights = &raw / raw.sum();
                PortfolioPoint {
                    metrics: self.portfolio_metrics(&weights),
                    weights: weights.to_vec(),
                }
            })
            .collect();

        let best_sharpe = portfolios
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.metrics.sharpe_ratio.map(|s| (i, s)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        let min_volatility = portfolios
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.metrics.volatility.total_cmp(&b.1.metrics.volatility))
            .map(|(i, _)| i);

        info!(simulations, "Monte Carlo portfolios evaluated");
        MonteCarloResult {
            symbols: self.model.symbols().to_vec(),
            portfolios,
            best_sharpe,
            min_volatility,
        }
    }

    /// Minimum-variance portfolios for `points` target returns spaced evenly
    /// from the minimum-variance return to the highest attainable return.
    /// Targets that fail to solve are logged and skipped.
    #[instrument(skip(self))]
    pub fn efficient_frontier(&self, points: usize) -> Result<Vec<PortfolioPoint>, OptimizerError> {
        if points < 2 {
            return Err(OptimizerError::InvalidParameters(
                "the efficient frontier needs at least two points".into(),
            ));
        }
        let mu = self.model.expected_returns();
        let cov = self.model.covariance();
        let low = mu.dot(&solvers::min_variance(cov, self.bounds, self.solver).weights);
        let high = mu.dot(&solvers::max_return_weights(mu, self.bounds));

        let targets: Vec<f64> = (0..points)
            .map(|i| low + (high - low) * i as f64 / (points - 1) as f64)
            .collect();

        let frontier: Vec<PortfolioPoint> = targets
            .into_par_iter()
            .filter_map(|target| {
                match solvers::target_return(mu, cov, target, self.bounds, self.solver) {
                    Ok(solution) => Some(PortfolioPoint {
                        metrics: self.portfolio_metrics(&solution.weights),
                        weights: solution.weights.to_vec(),
                    }),
                    Err(e) => {
                        warn!(target, error = %e, "Frontier point failed");
                        None
                    }
                }
            })
            .collect();
        Ok(frontier)
    }

    /// Historical risk profile of `weights`, in symbol order.
    pub fn detailed_metrics(&self, weights: &[f64]) -> Result<DetailedMetrics, OptimizerError> {
        if weights.len() != self.model.assets() {
            return Err(OptimizerError::InvalidParameters(format!(
                "{} weights for {} assets",
                weights.len(),
                self.model.assets()
            )));
        }
        let weights = Array1::from_vec(weights.to_vec());
        let metrics = self.portfolio_metrics(&weights);
        let history = self.model.portfolio_history(&weights);

        Ok(DetailedMetrics {
            expected_return: metrics.expected_return,
            volatility: metrics.volatility,
            sharpe_ratio: metrics.sharpe_ratio,
            skewness: risk::skewness(&history)?,
            excess_kurtosis: risk::excess_kurtosis(&history)?,
            var_95: risk::historical_var(&history, 0.95)?,
            cvar_95: risk::conditional_var(&history, 0.95)?,
            max_drawdown: risk::max_drawdown_from_returns(&history)?.max_drawdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    /// Three assets with distinct drifts and mild co-movement.
    fn model() -> MarketModel {
        let periods = 300;
        let returns = Array2::from_shape_fn((periods, 3), |(t, i)| {
            let wave = ((t * (i + 2)) as f64 * 0.7).sin();
            let common = (t as f64 * 0.3).cos() * 0.004;
            0.0004 * (i + 1) as f64 + 0.01 * (i + 1) as f64 * wave + common
        });
        MarketModel::from_returns(vec!["A".into(), "B".into(), "C".into()], returns, 252).unwrap()
    }

    fn optimizer() -> PortfolioOptimizer {
        PortfolioOptimizer::new(model(), &PortfolioSettings::default()).unwrap()
    }

    #[test]
    fn every_method_respects_constraints() {
        let optimizer = optimizer();
        for result in optimizer.compare_methods() {
            assert!(result.constraints_satisfied, "{} violated constraints", result.method);
            assert_abs_diff_eq!(result.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
            assert!(result.weights.iter().all(|w| *w >= -1e-9));
        }
        assert_eq!(optimizer.compare_methods().len(), 3);
    }

    #[test]
    fn max_sharpe_beats_random_portfolios() {
        let optimizer = optimizer();
        let best = optimizer.optimize(OptimizationMethod::MaxSharpe).unwrap();
        let cloud = optimizer.monte_carlo(2_000, Some(7));
        let best_random = cloud.portfolios[cloud.best_sharpe.unwrap()].metrics.sharpe_ratio.unwrap();
        assert!(best.metrics.sharpe_ratio.unwrap() >= best_random - 1e-4);
    }

    #[test]
    fn min_variance_beats_random_portfolios() {
        let optimizer = optimizer();
        let best = optimizer.optimize(OptimizationMethod::MinVariance).unwrap();
        let cloud = optimizer.monte_carlo(2_000, Some(7));
        let lowest = cloud.portfolios[cloud.min_volatility.unwrap()].metrics.volatility;
        assert!(best.metrics.volatility <= lowest + 1e-4);
    }

    #[test]
    fn monte_carlo_is_reproducible() {
        let optimizer = optimizer();
        let a = optimizer.monte_carlo(100, Some(1));
        let b = optimizer.monte_carlo(100, Some(1));
        assert_eq!(a.portfolios.len(), 100);
        for (x, y) in a.portfolios.iter().zip(&b.portfolios) {
            assert_eq!(x.weights, y.weights);
        }
    }

    #[test]
    fn frontier_is_monotone_in_return() {
        let frontier = optimizer().efficient_frontier(8).unwrap();
        assert_eq!(frontier.len(), 8);
        for pair in frontier.windows(2) {
            assert!(pair[1].metrics.expected_return >= pair[0].metrics.expected_return - 1e-4);
            assert!(pair[1].metrics.volatility >= pair[0].metrics.volatility - 1e-4);
        }
    }

    #[test]
    fn target_return_is_met() {
        let optimizer = optimizer();
        let mu = optimizer.model().expected_returns().clone();
        let target = mu.mean().unwrap();
        let result = optimizer.optimize(OptimizationMethod::TargetReturn(target)).unwrap();
        assert!(result.constraints_satisfied);
        assert!(result.metrics.expected_return >= target - 1e-6);

        let highest = mu.fold(f64::NEG_INFINITY, |a, &x| a.max(x));
        let unreachable = optimizer.optimize(OptimizationMethod::TargetReturn(highest + 1.0));
        assert!(matches!(unreachable, Err(OptimizerError::UnreachableTarget { .. })));
    }

    #[test]
    fn infeasible_bounds_are_rejected() {
        let settings = PortfolioSettings {
            max_position_weight: 0.2,
            ..PortfolioSettings::default()
        };
        assert!(matches!(
            PortfolioOptimizer::new(model(), &settings),
            Err(OptimizerError::InfeasibleBounds { .. })
        ));
    }

    #[test]
    fn detailed_metrics_cover_tail_risk() {
        let optimizer = optimizer();
        let metrics = optimizer.detailed_metrics(&[0.3, 0.3, 0.4]).unwrap();
        assert!(metrics.var_95 > 0.0);
        assert!(metrics.cvar_95 >= metrics.var_95);
        assert!(metrics.max_drawdown >= 0.0);
        assert!(optimizer.detailed_metrics(&[1.0]).is_err());
    }
}
