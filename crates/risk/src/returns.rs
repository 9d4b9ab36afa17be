use crate::error::{require_len, RiskError};

/// Period-over-period simple returns, `p[t] / p[t-1] - 1`. One shorter than the input.
pub fn simple_returns(prices: &[f64]) -> Result<Vec<f64>, RiskError> {
    require_len("simple returns", prices, 2)?;
    check_positive(prices)?;
    Ok(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Period-over-period log returns, `ln(p[t] / p[t-1])`.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>, RiskError> {
    require_len("log returns", prices, 2)?;
    check_positive(prices)?;
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

/// Compounded wealth index: `prod(1 + r[0..=t])` for each `t`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

fn check_positive(prices: &[f64]) -> Result<(), RiskError> {
    match prices.iter().position(|p| !(*p > 0.0)) {
        Some(index) => Err(RiskError::NonPositiveEquity {
            index,
            value: prices[index],
        }),
        None => Ok(()),
    }
}
