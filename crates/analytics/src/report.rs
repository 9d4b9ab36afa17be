use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A standardized report of a strategy's performance over one simulation.
///
/// Produced by the `AnalyticsEngine`; the CLI renders it as a table and the
/// backtester returns it alongside the raw trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Returns
    pub initial_equity: Decimal,
    pub final_equity: Decimal,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,

    // II. Risk-adjusted
    pub sharpe_ratio: Option<f64>, // None when volatility is zero
    pub max_drawdown: f64,
    pub calmar_ratio: Option<f64>, // None when there is no drawdown

    // III. Trade statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_net_profit: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Option<f64>, // None when no trade lost money
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub payoff_ratio: Option<f64>,
    pub average_trade_return: f64,

    // IV. Time
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

impl PerformanceReport {
    /// A zeroed report, used for empty simulations and as the starting point
    /// for the calculation passes.
    pub fn new() -> Self {
        Self {
            initial_equity: Decimal::ZERO,
            final_equity: Decimal::ZERO,
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: None,
            max_drawdown: 0.0,
            calmar_ratio: None,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_net_profit: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: None,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            payoff_ratio: None,
            average_trade_return: 0.0,
            average_holding_period: Duration::ZERO,
        }
    }

    /// Average holding period in fractional days, for display.
    pub fn average_holding_days(&self) -> f64 {
        self.average_holding_period.as_secs_f64() / 86_400.0
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}
