//! # Analytics
//!
//! Turns the output of a simulation (completed trades plus a timestamped equity
//! curve) into a [`PerformanceReport`].
//!
//! The [`AnalyticsEngine`] is a stateless calculator with no knowledge of how
//! the trades were produced, so the same report is used for backtests of any
//! strategy.
//!
//! Conventions:
//! - returns, drawdown and win rate are fractions (`0.12` = 12%);
//! - cash figures stay `Decimal`, statistics are `f64`;
//! - ratios that are undefined for the input are `None`.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::PerformanceReport;
