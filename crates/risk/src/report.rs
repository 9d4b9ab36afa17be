use crate::drawdown::max_drawdown_from_returns;
use crate::error::{require_confidence, require_len, RiskError};
use crate::ratios::{annualized_return, annualized_volatility, sharpe_ratio, sortino_ratio};
use crate::returns::simple_returns;
use crate::statistics::{excess_kurtosis, mean, skewness};
use crate::var::{conditional_var, historical_var, monte_carlo_var, parametric_var, scale_var};
use configuration::RiskSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Risk profile of a single return series.
///
/// VaR and CVaR figures are positive loss fractions, already scaled to
/// `horizon_days`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub observations: usize,
    pub confidence_level: f64,
    pub horizon_days: u32,

    // Return profile
    pub mean_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,

    // Risk-adjusted
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub max_drawdown: f64,

    // Tail risk
    pub historical_var: f64,
    pub parametric_var: f64,
    pub monte_carlo_var: f64,
    pub conditional_var: f64,
}

/// Computes [`RiskReport`]s with a fixed confidence, horizon and risk-free rate.
#[derive(Debug, Clone)]
pub struct RiskAnalyzer {
    settings: RiskSettings,
    risk_free_rate: f64,
    periods_per_year: f64,
}

impl RiskAnalyzer {
    pub fn new(settings: RiskSettings, risk_free_rate: f64, periods_per_year: usize) -> Result<Self, RiskError> {
        require_confidence(settings.confidence_level)?;
        if periods_per_year == 0 {
            return Err(RiskError::InvalidParameters("periods per year must be positive".into()));
        }
        if settings.horizon_days == 0 {
            return Err(RiskError::InvalidParameters("horizon must be at least one day".into()));
        }
        if settings.monte_carlo_simulations == 0 {
            return Err(RiskError::InvalidParameters("monte carlo simulations must be positive".into()));
        }
        Ok(Self {
            settings,
            risk_free_rate,
            periods_per_year: periods_per_year as f64,
        })
    }

    #[instrument(skip(self, returns), fields(n = returns.len()))]
    pub fn analyze(&self, returns: &[f64]) -> Result<RiskReport, RiskError> {
        require_len("risk report", returns, 2)?;
        let c = self.settings.confidence_level;
        let horizon = self.settings.horizon_days;
        let ppy = self.periods_per_year;

        let report = RiskReport {
            observations: returns.len(),
            confidence_level: c,
            horizon_days: horizon,
            mean_return: mean(returns)?,
            annualized_return: annualized_return(returns, ppy)?,
            annualized_volatility: annualized_volatility(returns, ppy)?,
            skewness: skewness(returns)?,
            excess_kurtosis: excess_kurtosis(returns)?,
            sharpe_ratio: sharpe_ratio(returns, self.risk_free_rate, ppy)?,
            sortino_ratio: sortino_ratio(returns, self.risk_free_rate, ppy)?,
            max_drawdown: max_drawdown_from_returns(returns)?.max_drawdown,
            historical_var: scale_var(historical_var(returns, c)?, horizon),
            parametric_var: scale_var(parametric_var(returns, c)?, horizon),
            monte_carlo_var: scale_var(
                monte_carlo_var(returns, c, self.settings.monte_carlo_simulations, self.settings.seed)?,
                horizon,
            ),
            conditional_var: scale_var(conditional_var(returns, c)?, horizon),
        };
        debug!(var = report.historical_var, cvar = report.conditional_var, "Risk report computed");
        Ok(report)
    }

    /// Converts closing prices to simple returns and analyses them.
    pub fn analyze_prices(&self, prices: &[f64]) -> Result<RiskReport, RiskError> {
        let returns = simple_returns(prices)?;
        self.analyze(&returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> RiskSettings {
        RiskSettings {
            confidence_level: 0.95,
            horizon_days: 1,
            monte_carlo_simulations: 5_000,
            seed: Some(42),
        }
    }

    fn zigzag_prices() -> Vec<f64> {
        (0..120)
            .map(|i| 100.0 * (1.0 + 0.002 * i as f64) * if i % 3 == 0 { 0.98 } else { 1.01 })
            .collect()
    }

    #[test]
    fn report_fields_are_consistent() {
        let analyzer = RiskAnalyzer::new(settings(), 0.02, 252).unwrap();
        let report = analyzer.analyze_prices(&zigzag_prices()).unwrap();

        assert_eq!(report.observations, 119);
        assert!(report.annualized_volatility > 0.0);
        assert!(report.historical_var > 0.0);
        assert!(report.conditional_var >= report.historical_var);
        assert!(report.max_drawdown > 0.0 && report.max_drawdown < 1.0);
        assert!(report.sharpe_ratio.is_some());
    }

    #[test]
    fn horizon_scales_tail_metrics() {
        let one_day = RiskAnalyzer::new(settings(), 0.0, 252).unwrap();
        let ten_day = RiskAnalyzer::new(RiskSettings { horizon_days: 10, ..settings() }, 0.0, 252).unwrap();
        let prices = zigzag_prices();
        let a = one_day.analyze_prices(&prices).unwrap();
        let b = ten_day.analyze_prices(&prices).unwrap();
        assert_relative_eq!(b.historical_var, a.historical_var * 10f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(b.monte_carlo_var, a.monte_carlo_var * 10f64.sqrt(), epsilon = 1e-12);
        assert_eq!(a.sharpe_ratio, b.sharpe_ratio);
    }

    #[test]
    fn rejects_zero_horizon_and_simulations() {
        let zero_horizon = RiskSettings { horizon_days: 0, ..settings() };
        assert!(matches!(
            RiskAnalyzer::new(zero_horizon, 0.0, 252),
            Err(RiskError::InvalidParameters(msg)) if msg.contains("horizon")
        ));
        let no_paths = RiskSettings { monte_carlo_simulations: 0, ..settings() };
        assert!(matches!(RiskAnalyzer::new(no_paths, 0.0, 252), Err(RiskError::InvalidParameters(_))));
    }

    #[test]
    fn rejects_bad_confidence() {
        let bad = RiskSettings { confidence_level: 1.5, ..settings() };
        assert_eq!(RiskAnalyzer::new(bad, 0.0, 252).unwrap_err(), RiskError::InvalidConfidence(1.5));
    }

    #[test]
    fn too_few_prices_is_an_error() {
        let analyzer = RiskAnalyzer::new(settings(), 0.0, 252).unwrap();
        assert!(matches!(
            analyzer.analyze_prices(&[100.0, 101.0]),
            Err(RiskError::InsufficientData { .. })
        ));
    }
}
