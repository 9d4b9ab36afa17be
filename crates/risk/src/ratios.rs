use crate::error::{require_len, RiskError};
use crate::statistics::{mean, std_dev};

/// Annualised Sharpe ratio of per-period `returns` against an annual risk-free rate.
///
/// `None` when the returns have zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_annual: f64, periods_per_year: f64) -> Result<Option<f64>, RiskError> {
    require_len("Sharpe ratio", returns, 2)?;
    let excess = mean(returns)? - risk_free_annual / periods_per_year;
    let sigma = std_dev(returns, 1)?;
    Ok((sigma > 0.0).then(|| excess / sigma * periods_per_year.sqrt()))
}

/// Annualised Sortino ratio. Downside deviation is the root mean square of
/// shortfalls below the per-period risk-free rate, over all observations.
///
/// `None` when no return falls below the risk-free rate.
pub fn sortino_ratio(returns: &[f64], risk_free_annual: f64, periods_per_year: f64) -> Result<Option<f64>, RiskError> {
    require_len("Sortino ratio", returns, 2)?;
    let target = risk_free_annual / periods_per_year;
    let excess = mean(returns)? - target;
    let downside = returns
        .iter()
        .map(|r| (r - target).min(0.0).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let downside = downside.sqrt();
    Ok((downside > 0.0).then(|| excess / downside * periods_per_year.sqrt()))
}

/// Annual return per unit of maximum drawdown.
pub fn calmar_ratio(annual_return: f64, max_drawdown: f64) -> Option<f64> {
    (max_drawdown > 0.0).then(|| annual_return / max_drawdown)
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Result<f64, RiskError> {
    Ok(std_dev(returns, 1)? * periods_per_year.sqrt())
}

/// Geometric annualisation of the compounded return.
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> Result<f64, RiskError> {
    require_len("annualized return", returns, 1)?;
    let growth = returns.iter().map(|r| 1.0 + r).product::<f64>();
    if growth <= 0.0 {
        return Ok(-1.0);
    }
    Ok(growth.powf(periods_per_year / returns.len() as f64) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sharpe_matches_closed_form() {
        let returns = [0.01, 0.03];
        // mean 0.02, sample std sqrt(0.0002)
        let expected = 0.02 / 0.0002f64.sqrt() * 252f64.sqrt();
        assert_relative_eq!(sharpe_ratio(&returns, 0.0, 252.0).unwrap().unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn risk_free_rate_is_deannualised() {
        let returns = [0.01, 0.03];
        let with_rf = sharpe_ratio(&returns, 2.52, 252.0).unwrap().unwrap();
        let expected = (0.02 - 0.01) / 0.0002f64.sqrt() * 252f64.sqrt();
        assert_relative_eq!(with_rf, expected, epsilon = 1e-9);
    }

    #[test]
    fn constant_returns_have_no_sharpe() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01], 0.0, 252.0).unwrap(), None);
    }

    #[test]
    fn sortino_only_penalises_downside() {
        let returns = [0.02, -0.01, 0.02, -0.01];
        // downside = sqrt((0.0001 + 0.0001) / 4)
        let expected = 0.005 / 0.00005f64.sqrt() * 252f64.sqrt();
        assert_relative_eq!(sortino_ratio(&returns, 0.0, 252.0).unwrap().unwrap(), expected, epsilon = 1e-9);
        assert_eq!(sortino_ratio(&[0.01, 0.02], 0.0, 252.0).unwrap(), None);
    }

    #[test]
    fn calmar_needs_a_drawdown() {
        assert_eq!(calmar_ratio(0.2, 0.1), Some(2.0));
        assert_eq!(calmar_ratio(0.2, 0.0), None);
    }

    #[test]
    fn annualized_return_compounds() {
        // two periods of 10% with two periods per year
        assert_relative_eq!(annualized_return(&[0.1, 0.1], 2.0).unwrap(), 0.21, epsilon = 1e-12);
        assert_relative_eq!(annualized_return(&[-1.0], 252.0).unwrap(), -1.0);
    }

    #[test]
    fn annualized_volatility_scales_by_root_periods() {
        let returns = [0.01, 0.03];
        assert_relative_eq!(annualized_volatility(&returns, 4.0).unwrap(), 2.0 * 0.0002f64.sqrt(), epsilon = 1e-12);
    }
}
