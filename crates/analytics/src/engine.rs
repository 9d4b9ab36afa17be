use crate::error::AnalyticsError;
use crate::report::PerformanceReport;
use chrono::{DateTime, Utc};
use core_types::Trade;
use risk::{calmar_ratio, max_drawdown, std_dev};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, instrument};

const TRADING_DAYS: f64 = 252.0;
const CALENDAR_DAYS: f64 = 365.0;

/// A stateless calculator for deriving performance metrics from trading activity.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the full performance report.
    ///
    /// # Arguments
    ///
    /// * `trades` - All completed `Trade`s from the simulation.
    /// * `equity_curve` - Portfolio value after each bar, in chronological order.
    /// * `risk_free_rate` - Annual risk-free rate used for the Sharpe ratio.
    #[instrument(skip_all, fields(trades = trades.len(), bars = equity_curve.len()))]
    pub fn calculate(
        &self,
        trades: &[Trade],
        equity_curve: &[(DateTime<Utc>, Decimal)],
        risk_free_rate: f64,
    ) -> Result<PerformanceReport, AnalyticsError> {
        let mut report = PerformanceReport::new();

        if equity_curve.is_empty() {
            return Ok(report);
        }

        self.calculate_returns(equity_curve, risk_free_rate, &mut report)?;
        self.calculate_trade_statistics(trades, &mut report);
        self.calculate_time_metrics(trades, &mut report);

        debug!(
            total_return = report.total_return,
            max_drawdown = report.max_drawdown,
            "Performance report calculated"
        );
        Ok(report)
    }

    /// Return, volatility, drawdown and the ratios built from them.
    fn calculate_returns(
        &self,
        equity_curve: &[(DateTime<Utc>, Decimal)],
        risk_free_rate: f64,
        report: &mut PerformanceReport,
    ) -> Result<(), AnalyticsError> {
        if let Some(i) = equity_curve.windows(2).position(|w| w[1].0 < w[0].0) {
            return Err(AnalyticsError::UnorderedEquity(i + 1));
        }

        let (first_time, first_equity) = equity_curve[0];
        let (last_time, last_equity) = equity_curve[equity_curve.len() - 1];
        if first_equity <= Decimal::ZERO {
            return Err(AnalyticsError::NonPositiveCapital(first_equity.to_string()));
        }
        report.initial_equity = first_equity;
        report.final_equity = last_equity;

        let equity = equity_curve
            .iter()
            .map(|(_, value)| {
                value
                    .to_f64()
                    .ok_or_else(|| AnalyticsError::NonFiniteEquity(value.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let start = equity[0];
        let end = equity[equity.len() - 1];
        report.total_return = (end - start) / start;

        let days = (last_time - first_time).num_days();
        report.annualized_return = if days > 0 {
            let growth = 1.0 + report.total_return;
            if growth > 0.0 {
                growth.powf(CALENDAR_DAYS / days as f64) - 1.0
            } else {
                -1.0
            }
        } else {
            report.total_return
        };

        let bar_returns: Vec<f64> = equity.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        report.volatility = if bar_returns.is_empty() {
            0.0
        } else {
            std_dev(&bar_returns, 0)? * TRADING_DAYS.sqrt()
        };

        if report.volatility > 0.0 {
            report.sharpe_ratio = Some((report.annualized_return - risk_free_rate) / report.volatility);
        }

        report.max_drawdown = max_drawdown(&equity)?.max_drawdown;
        report.calmar_ratio = calmar_ratio(report.annualized_return, report.max_drawdown);
        Ok(())
    }

    /// Win/loss counts and profit statistics. Break-even trades count towards
    /// the total but neither side.
    fn calculate_trade_statistics(&self, trades: &[Trade], report: &mut PerformanceReport) {
        report.total_trades = trades.len();
        if trades.is_empty() {
            return;
        }

        for trade in trades {
            report.total_net_profit += trade.pnl;
            if trade.pnl > Decimal::ZERO {
                report.gross_profit += trade.pnl;
                report.winning_trades += 1;
            } else if trade.pnl < Decimal::ZERO {
                report.gross_loss += trade.pnl.abs();
                report.losing_trades += 1;
            }
        }

        report.win_rate = report.winning_trades as f64 / report.total_trades as f64;

        if report.gross_loss > Decimal::ZERO {
            report.profit_factor = (report.gross_profit / report.gross_loss).to_f64();
        }
        if report.winning_trades > 0 {
            report.average_win = report.gross_profit / Decimal::from(report.winning_trades);
        }
        if report.losing_trades > 0 {
            report.average_loss = report.gross_loss / Decimal::from(report.losing_trades);
            report.payoff_ratio = (report.average_win / report.average_loss).to_f64();
        }

        report.average_trade_return =
            trades.iter().map(|t| t.pnl_pct).sum::<f64>() / trades.len() as f64;
    }

    fn calculate_time_metrics(&self, trades: &[Trade], report: &mut PerformanceReport) {
        if trades.is_empty() {
            return;
        }
        let total_secs: i64 = trades
            .iter()
            .map(|t| (t.exit_time - t.entry_time).num_seconds().max(0))
            .sum();
        report.average_holding_period = Duration::from_secs((total_secs / trades.len() as i64) as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use core_types::OrderSide;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::days(n)
    }

    fn trade(pnl: Decimal, pnl_pct: f64, entry_day: i64, exit_day: i64) -> Trade {
        Trade {
            trade_id: Uuid::new_v4(),
            symbol: "TEST".into(),
            side: OrderSide::Buy,
            entry_time: day(entry_day),
            exit_time: day(exit_day),
            entry_price: dec!(100),
            exit_price: dec!(100),
            quantity: 10,
            pnl,
            pnl_pct,
            holding_period_days: exit_day - entry_day,
        }
    }

    #[test]
    fn empty_equity_curve_gives_zeroed_report() {
        let report = AnalyticsEngine::new().calculate(&[], &[], 0.02).unwrap();
        assert_eq!(report, PerformanceReport::new());
    }

    #[test]
    fn returns_and_drawdown_from_equity_curve() {
        let curve = vec![
            (day(0), dec!(100000)),
            (day(1), dec!(110000)),
            (day(2), dec!(99000)),
            (day(365), dec!(121000)),
        ];
        let report = AnalyticsEngine::new().calculate(&[], &curve, 0.0).unwrap();

        assert_relative_eq!(report.total_return, 0.21, epsilon = 1e-12);
        assert_relative_eq!(report.annualized_return, 0.21, epsilon = 1e-12);
        assert_relative_eq!(report.max_drawdown, 0.1, epsilon = 1e-12);
        assert_relative_eq!(report.calmar_ratio.unwrap(), 2.1, epsilon = 1e-9);
        assert!(report.volatility > 0.0);
        assert_relative_eq!(report.sharpe_ratio.unwrap(), 0.21 / report.volatility, epsilon = 1e-12);
        assert_eq!(report.final_equity, dec!(121000));
    }

    #[test]
    fn flat_curve_has_no_sharpe_or_calmar() {
        let curve = vec![(day(0), dec!(1000)), (day(1), dec!(1000)), (day(2), dec!(1000))];
        let report = AnalyticsEngine::new().calculate(&[], &curve, 0.02).unwrap();
        assert_eq!(report.volatility, 0.0);
        assert_eq!(report.sharpe_ratio, None);
        assert_eq!(report.calmar_ratio, None);
    }

    #[test]
    fn same_day_curve_uses_total_return() {
        let curve = vec![(day(0), dec!(100)), (day(0), dec!(105))];
        let report = AnalyticsEngine::new().calculate(&[], &curve, 0.0).unwrap();
        assert_relative_eq!(report.annualized_return, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn trade_statistics() {
        let trades = vec![
            trade(dec!(300), 0.03, 0, 4),
            trade(dec!(100), 0.01, 5, 7),
            trade(dec!(-200), -0.02, 8, 14),
            trade(dec!(0), 0.0, 15, 15),
        ];
        let curve = vec![(day(0), dec!(10000)), (day(15), dec!(10200))];
        let report = AnalyticsEngine::new().calculate(&trades, &curve, 0.0).unwrap();

        assert_eq!(report.total_trades, 4);
        assert_eq!(report.winning_trades, 2);
        assert_eq!(report.losing_trades, 1);
        assert_relative_eq!(report.win_rate, 0.5);
        assert_eq!(report.total_net_profit, dec!(200));
        assert_eq!(report.gross_profit, dec!(400));
        assert_eq!(report.gross_loss, dec!(200));
        assert_eq!(report.profit_factor, Some(2.0));
        assert_eq!(report.average_win, dec!(200));
        assert_eq!(report.average_loss, dec!(200));
        assert_eq!(report.payoff_ratio, Some(1.0));
        assert_relative_eq!(report.average_trade_return, 0.005, epsilon = 1e-12);
        assert_relative_eq!(report.average_holding_days(), 3.0);
    }

    #[test]
    fn all_winning_trades_have_no_profit_factor() {
        let trades = vec![trade(dec!(50), 0.05, 0, 1)];
        let curve = vec![(day(0), dec!(1000)), (day(1), dec!(1050))];
        let report = AnalyticsEngine::new().calculate(&trades, &curve, 0.0).unwrap();
        assert_eq!(report.profit_factor, None);
        assert_eq!(report.payoff_ratio, None);
        assert_relative_eq!(report.win_rate, 1.0);
    }

    #[test]
    fn unordered_curve_is_rejected() {
        let curve = vec![(day(2), dec!(100)), (day(1), dec!(101))];
        assert!(matches!(
            AnalyticsEngine::new().calculate(&[], &curve, 0.0),
            Err(AnalyticsError::UnorderedEquity(1))
        ));
    }
}
