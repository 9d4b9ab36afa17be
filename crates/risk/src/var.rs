//! Value at Risk estimators.
//!
//! Every estimator reports VaR as a positive loss fraction: a return of
//! `-0.03` at the tail becomes a VaR of `0.03`. A tail that is still a gain
//! produces a negative VaR, which is left as-is rather than floored.

use crate::error::{require_confidence, require_len, RiskError};
use crate::statistics::{mean, percentile, std_dev};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal as SamplingNormal};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Empirical VaR: the negated `1 - confidence` quantile of observed returns.
pub fn historical_var(returns: &[f64], confidence: f64) -> Result<f64, RiskError> {
    require_confidence(confidence)?;
    Ok(-percentile(returns, 1.0 - confidence)?)
}

/// Variance-covariance VaR under a normal fit of the returns.
pub fn parametric_var(returns: &[f64], confidence: f64) -> Result<f64, RiskError> {
    require_confidence(confidence)?;
    require_len("parametric VaR", returns, 2)?;
    let mu = mean(returns)?;
    let sigma = std_dev(returns, 1)?;
    let z = standard_normal()?.inverse_cdf(1.0 - confidence);
    Ok(-(mu + z * sigma))
}

/// Simulated VaR: draws `simulations` returns from a normal fitted to the
/// sample and takes the empirical quantile of the draws.
///
/// The same `seed` always produces the same estimate; `None` seeds from entropy.
pub fn monte_carlo_var(
    returns: &[f64],
    confidence: f64,
    simulations: usize,
    seed: Option<u64>,
) -> Result<f64, RiskError> {
    require_confidence(confidence)?;
    require_len("Monte Carlo VaR", returns, 2)?;
    if simulations == 0 {
        return Err(RiskError::InvalidParameters(
            "Monte Carlo VaR needs at least one simulation".into(),
        ));
    }
    let mu = mean(returns)?;
    let sigma = std_dev(returns, 1)?;
    let normal = SamplingNormal::new(mu, sigma).map_err(|e| RiskError::Distribution(e.to_string()))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let draws: Vec<f64> = (0..simulations).map(|_| normal.sample(&mut rng)).collect();
    debug!(simulations, mu, sigma, "Simulated return distribution");
    historical_var(&draws, confidence)
}

/// Square-root-of-time scaling of a one-period VaR to `horizon_days` periods.
pub fn scale_var(one_period_var: f64, horizon_days: u32) -> f64 {
    one_period_var * f64::from(horizon_days).sqrt()
}

/// Expected shortfall: the negated mean of returns at or below the VaR quantile.
pub fn conditional_var(returns: &[f64], confidence: f64) -> Result<f64, RiskError> {
    require_confidence(confidence)?;
    let threshold = percentile(returns, 1.0 - confidence)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    Ok(-mean(&tail)?)
}

fn standard_normal() -> Result<Normal, RiskError> {
    Normal::new(0.0, 1.0).map_err(|e| RiskError::Distribution(e.to_string()))
}
