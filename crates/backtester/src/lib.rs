//! # Backtester
//!
//! Replays daily bars through a [`Strategy`] on a long-only, single-symbol
//! account and hands the resulting trades and equity curve to the analytics
//! engine.

use analytics::{AnalyticsEngine, PerformanceReport};
use chrono::{DateTime, Utc};
use configuration::Simulation;
use core_types::{Kline, OrderSide, Signal, Trade};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use strategies::Strategy;
use tracing::{debug, info, instrument};

pub mod error;
pub mod portfolio;

pub use error::{BacktestError, PortfolioError};
pub use portfolio::Portfolio;

/// Everything a backtest produced.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub symbol: String,
    pub report: PerformanceReport,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<(DateTime<Utc>, Decimal)>,
}

/// The backtesting engine.
pub struct Backtester {
    settings: Simulation,
    risk_free_rate: f64,
    analytics_engine: AnalyticsEngine,
    show_progress: bool,
}

impl Backtester {
    pub fn new(settings: Simulation, risk_free_rate: f64) -> Self {
        Self {
            settings,
            risk_free_rate,
            analytics_engine: AnalyticsEngine::new(),
            show_progress: false,
        }
    }

    /// Draws a progress bar on stderr while the simulation runs.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Runs the simulation over `klines`, which must be in chronological order
    /// with strictly positive prices.
    ///
    /// On every bar the strategy is evaluated first; a buy opens a position only
    /// when flat and a sell closes it only when long. Equity is marked at the
    /// close after the signal has been handled. A position still open after the
    /// last bar is closed at the final close.
    #[instrument(skip(self, strategy, klines), fields(strategy = strategy.name(), bars = klines.len()))]
    pub fn run(
        &self,
        strategy: &mut dyn Strategy,
        klines: &[Kline],
        symbol: &str,
    ) -> Result<BacktestResult, BacktestError> {
        if klines.is_empty() {
            return Err(BacktestError::DataUnavailable);
        }
        if let Some(i) = klines.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BacktestError::UnorderedData { index: i + 1 });
        }
        if let Some(index) = klines.iter().position(|k| !k.is_valid()) {
            return Err(BacktestError::InvalidPrice { index });
        }

        let mut portfolio = Portfolio::new(self.settings.initial_capital, self.settings.commission_pct);
        let mut equity_curve = Vec::with_capacity(klines.len());
        let mut completed_trades = Vec::new();

        let progress_bar = if self.show_progress {
            ProgressBar::new(klines.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        for kline in klines {
            // --- 1. STRATEGY EVALUATION ---
            if let Some(signal) = strategy.evaluate(kline)? {
                // --- 2. SIGNAL PROCESSING ---
                match signal.side {
                    OrderSide::Buy if portfolio.position(symbol).is_none() => {
                        self.try_enter(&mut portfolio, &signal, kline, symbol)?;
                    }
                    OrderSide::Sell if portfolio.position(symbol).is_some() => {
                        let trade = portfolio.close(symbol, kline.close, kline.timestamp)?;
                        info!(symbol, quantity = trade.quantity, price = %kline.close, pnl = %trade.pnl, "SELL");
                        completed_trades.push(trade);
                    }
                    _ => debug!(side = ?signal.side, "Signal ignored for current position state"),
                }
            }

            // --- 3. RECORD EQUITY ---
            let market_prices = HashMap::from([(symbol.to_string(), kline.close)]);
            equity_curve.push((kline.timestamp, portfolio.total_equity(&market_prices)?));
            progress_bar.inc(1);
        }

        if portfolio.position(symbol).is_some() {
            let last = &klines[klines.len() - 1];
            let trade = portfolio.close(symbol, last.close, last.timestamp)?;
            info!(symbol, pnl = %trade.pnl, "Closed open position at end of data");
            completed_trades.push(trade);
            // Reflect the exit commission in the final equity point.
            if let Some(point) = equity_curve.last_mut() {
                point.1 = portfolio.cash;
            }
        }
        progress_bar.finish_and_clear();

        let report = self
            .analytics_engine
            .calculate(&completed_trades, &equity_curve, self.risk_free_rate)?;

        Ok(BacktestResult {
            strategy: strategy.name().to_string(),
            symbol: symbol.to_string(),
            report,
            trades: completed_trades,
            equity_curve,
        })
    }

    /// Sizes the entry as a fraction of cash scaled by signal strength and opens
    /// it if the account can afford it.
    fn try_enter(
        &self,
        portfolio: &mut Portfolio,
        signal: &Signal,
        kline: &Kline,
        symbol: &str,
    ) -> Result<(), BacktestError> {
        let strength = Decimal::from_f64(signal.strength.abs()).unwrap_or(Decimal::ONE);
        let budget = portfolio.cash * self.settings.position_fraction * strength;
        let quantity = budget
            .checked_div(kline.close)
            .and_then(|q| q.floor().to_u64())
            .unwrap_or(0);

        if quantity == 0 {
            debug!(%budget, price = %kline.close, "Budget too small for one share");
            return Ok(());
        }
        if portfolio.entry_cost(quantity, kline.close) > portfolio.cash {
            debug!(quantity, "Entry cost exceeds available cash");
            return Ok(());
        }

        portfolio.open(symbol, quantity, kline.close, kline.timestamp)?;
        info!(symbol, quantity, price = %kline.close, "BUY");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use strategies::StrategyError;

    /// Emits a fixed signal on chosen bar indices.
    struct Scripted {
        bar: usize,
        script: Vec<(usize, OrderSide)>,
    }

    impl Strategy for Scripted {
        fn evaluate(&mut self, kline: &Kline) -> Result<Option<Signal>, StrategyError> {
            let i = self.bar;
            self.bar += 1;
            Ok(self.script.iter().find(|(at, _)| *at == i).map(|(_, side)| Signal {
                timestamp: kline.timestamp,
                symbol: "TEST".into(),
                side: *side,
                strength: 1.0,
            }))
        }

        fn name(&self) -> &'static str {
            "Scripted"
        }
    }

    fn bars(closes: &[Decimal]) -> Vec<Kline> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Kline {
                timestamp: start + Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: dec!(1000),
            })
            .collect()
    }

    fn settings() -> Simulation {
        Simulation {
            initial_capital: dec!(100000),
            commission_pct: dec!(0.001),
            position_fraction: dec!(0.1),
        }
    }

    #[test]
    fn executes_round_trip_and_records_equity() {
        let klines = bars(&[dec!(100), dec!(100), dec!(110), dec!(120)]);
        let mut strategy = Scripted { bar: 0, script: vec![(1, OrderSide::Buy), (2, OrderSide::Sell)] };
        let result = Backtester::new(settings(), 0.0).run(&mut strategy, &klines, "TEST").unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        // 10% of 100000 at 100 = 100 shares
        assert_eq!(trade.quantity, 100);
        // cost 10010, proceeds 11000 * 0.999 = 10989
        assert_eq!(trade.pnl, dec!(979));
        assert_eq!(trade.holding_period_days, 1);

        let equity: Vec<Decimal> = result.equity_curve.iter().map(|(_, e)| *e).collect();
        assert_eq!(equity, vec![dec!(100000), dec!(99990), dec!(100979), dec!(100979)]);
        assert_eq!(result.report.total_trades, 1);
        assert_eq!(result.report.winning_trades, 1);
    }

    #[test]
    fn open_position_is_closed_at_last_bar() {
        let klines = bars(&[dec!(50), dec!(55), dec!(60)]);
        let mut strategy = Scripted { bar: 0, script: vec![(0, OrderSide::Buy)] };
        let result = Backtester::new(settings(), 0.0).run(&mut strategy, &klines, "TEST").unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_price, dec!(60));
        let (_, last_equity) = result.equity_curve[2];
        assert!(last_equity > dec!(100000));
        assert_eq!(result.report.final_equity, last_equity);
    }

    #[test]
    fn sell_while_flat_and_repeated_buy_are_ignored() {
        let klines = bars(&[dec!(10), dec!(11), dec!(12), dec!(13)]);
        let script = vec![(0, OrderSide::Sell), (1, OrderSide::Buy), (2, OrderSide::Buy), (3, OrderSide::Sell)];
        let mut strategy = Scripted { bar: 0, script };
        let result = Backtester::new(settings(), 0.0).run(&mut strategy, &klines, "TEST").unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_price, dec!(11));
    }

    #[test]
    fn empty_and_unordered_data_are_rejected() {
        let backtester = Backtester::new(settings(), 0.0);
        let mut strategy = Scripted { bar: 0, script: vec![] };
        assert!(matches!(
            backtester.run(&mut strategy, &[], "TEST"),
            Err(BacktestError::DataUnavailable)
        ));

        let mut klines = bars(&[dec!(1), dec!(2), dec!(3)]);
        klines.swap(1, 2);
        assert!(matches!(
            backtester.run(&mut strategy, &klines, "TEST"),
            Err(BacktestError::UnorderedData { index: 2 })
        ));
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        let backtester = Backtester::new(settings(), 0.0);
        let mut strategy = Scripted { bar: 0, script: vec![(1, OrderSide::Buy)] };
        assert!(matches!(
            backtester.run(&mut strategy, &bars(&[dec!(100), dec!(0), dec!(10)]), "TEST"),
            Err(BacktestError::InvalidPrice { index: 1 })
        ));

        let mut strategy = Scripted { bar: 0, script: vec![] };
        assert!(matches!(
            backtester.run(&mut strategy, &bars(&[dec!(5), dec!(6), dec!(-7)]), "TEST"),
            Err(BacktestError::InvalidPrice { index: 2 })
        ));
    }

    #[test]
    fn negative_volume_is_rejected() {
        let mut klines = bars(&[dec!(10), dec!(11)]);
        klines[0].volume = dec!(-1);
        let mut strategy = Scripted { bar: 0, script: vec![] };
        assert!(matches!(
            Backtester::new(settings(), 0.0).run(&mut strategy, &klines, "TEST"),
            Err(BacktestError::InvalidPrice { index: 0 })
        ));
    }

    #[test]
    fn tiny_budget_buys_nothing() {
        let klines = bars(&[dec!(1000000), dec!(1000000)]);
        let mut strategy = Scripted { bar: 0, script: vec![(0, OrderSide::Buy)] };
        let result = Backtester::new(settings(), 0.0).run(&mut strategy, &klines, "TEST").unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.report.total_return, 0.0);
    }
}
