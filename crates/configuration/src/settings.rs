use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` (or none at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: Simulation,
    pub strategies: Strategies,
    pub portfolio: PortfolioSettings,
    pub risk: RiskSettings,
    pub sentiment: SentimentSettings,
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects values that would make downstream calculations meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.strategies.validate()?;
        self.portfolio.validate()?;
        self.risk.validate()?;
        self.sentiment.validate()?;
        self.api.validate()?;
        Ok(())
    }
}

/// Contains parameters for the backtesting engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Starting cash for every backtest run.
    pub initial_capital: Decimal,
    /// Commission charged on both entry and exit notional. 0.001 is 0.1%.
    pub commission_pct: Decimal,
    /// Share of available cash committed to a full-strength entry.
    pub position_fraction: Decimal,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            initial_capital: dec!(100000),
            commission_pct: dec!(0.001),
            position_fraction: dec!(0.1),
        }
    }
}

impl Simulation {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::invalid("simulation", "initial_capital must be positive"));
        }
        if self.commission_pct < Decimal::ZERO || self.commission_pct >= Decimal::ONE {
            return Err(ConfigError::invalid("simulation", "commission_pct must be in [0, 1)"));
        }
        if self.position_fraction <= Decimal::ZERO || self.position_fraction > Decimal::ONE {
            return Err(ConfigError::invalid("simulation", "position_fraction must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Contains the parameter sets for all available strategies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Strategies {
    pub ma_crossover: MACrossoverParams,
    pub rsi: RsiParams,
}

impl Strategies {
    fn validate(&self) -> Result<(), ConfigError> {
        let ma = &self.ma_crossover;
        if ma.short_window == 0 || ma.short_window >= ma.long_window {
            return Err(ConfigError::invalid(
                "strategies.ma_crossover",
                "short_window must be non-zero and smaller than long_window",
            ));
        }
        let rsi = &self.rsi;
        if rsi.period == 0 {
            return Err(ConfigError::invalid("strategies.rsi", "period must be non-zero"));
        }
        if !(0.0..=100.0).contains(&rsi.oversold)
            || !(0.0..=100.0).contains(&rsi.overbought)
            || rsi.oversold >= rsi.overbought
        {
            return Err(ConfigError::invalid(
                "strategies.rsi",
                "thresholds must satisfy 0 <= oversold < overbought <= 100",
            ));
        }
        Ok(())
    }
}

/// Parameters for the moving average crossover strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MACrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MACrossoverParams {
    fn default() -> Self {
        Self {
            short_window: 20,
            long_window: 50,
        }
    }
}

/// Parameters for the RSI threshold strategy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

/// Parameters for the mean-variance optimizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    /// Annual risk-free rate used in every Sharpe ratio.
    pub risk_free_rate: f64,
    pub min_position_weight: f64,
    pub max_position_weight: f64,
    /// Periods per year used to annualise daily statistics.
    pub trading_days: usize,
    pub monte_carlo_simulations: usize,
    pub frontier_points: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: Option<u64>,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            min_position_weight: 0.0,
            max_position_weight: 1.0,
            trading_days: 252,
            monte_carlo_simulations: 10_000,
            frontier_points: 50,
            max_iterations: 5_000,
            tolerance: 1e-10,
            seed: Some(42),
        }
    }
}

impl PortfolioSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_position_weight < 0.0 || self.max_position_weight > 1.0 {
            return Err(ConfigError::invalid(
                "portfolio",
                "position weights must lie within [0, 1]",
            ));
        }
        if self.min_position_weight > self.max_position_weight {
            return Err(ConfigError::invalid(
                "portfolio",
                "min_position_weight exceeds max_position_weight",
            ));
        }
        if self.trading_days == 0 || self.max_iterations == 0 {
            return Err(ConfigError::invalid(
                "portfolio",
                "trading_days and max_iterations must be non-zero",
            ));
        }
        if self.tolerance <= 0.0 {
            return Err(ConfigError::invalid("portfolio", "tolerance must be positive"));
        }
        Ok(())
    }
}

/// Parameters for the risk report.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub confidence_level: f64,
    pub horizon_days: u32,
    pub monte_carlo_simulations: usize,
    pub seed: Option<u64>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            horizon_days: 1,
            monte_carlo_simulations: 10_000,
            seed: Some(42),
        }
    }
}

impl RiskSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::invalid("risk", "confidence_level must be in (0, 1)"));
        }
        if self.horizon_days == 0 || self.monte_carlo_simulations == 0 {
            return Err(ConfigError::invalid(
                "risk",
                "horizon_days and monte_carlo_simulations must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Blending weights and label thresholds for the sentiment analyzer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentSettings {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    pub polarity_weight: f64,
    pub compound_weight: f64,
    pub financial_weight: f64,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            positive_threshold: 0.1,
            negative_threshold: -0.1,
            polarity_weight: 0.3,
            compound_weight: 0.5,
            financial_weight: 0.2,
        }
    }
}

impl SentimentSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.negative_threshold > self.positive_threshold {
            return Err(ConfigError::invalid(
                "sentiment",
                "negative_threshold must not exceed positive_threshold",
            ));
        }
        let weights = [self.polarity_weight, self.compound_weight, self.financial_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::invalid(
                "sentiment",
                "weights must be non-negative with a positive sum",
            ));
        }
        Ok(())
    }
}

/// Endpoints and limits for outbound HTTP.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub yahoo_base_url: String,
    /// Base URL of the remote analytics API.
    pub dashboard_base_url: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub default_period: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            dashboard_base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            max_concurrency: 5,
            default_period: "1y".to_string(),
        }
    }
}

impl ApiSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 || self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "api",
                "max_concurrency and timeout_secs must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, e.g. `info` or `finscope=debug,optimizer=trace`.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "finscope.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn crossed_moving_average_windows_are_rejected() {
        let mut config = Config::default();
        config.strategies.ma_crossover.short_window = 50;
        config.strategies.ma_crossover.long_window = 20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { section: "strategies.ma_crossover", .. })
        ));
    }

    #[test]
    fn rsi_thresholds_must_be_ordered() {
        let mut config = Config::default();
        config.strategies.rsi.oversold = 80.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn infeasible_weight_bounds_are_rejected() {
        let mut config = Config::default();
        config.portfolio.min_position_weight = 0.6;
        config.portfolio.max_position_weight = 0.4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn confidence_must_be_a_probability() {
        let mut config = Config::default();
        config.risk.confidence_level = 1.0;
        assert!(config.validate().is_err());
    }
}
