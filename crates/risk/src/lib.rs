//! # Risk
//!
//! Stateless risk statistics over return and equity series, and the
//! [`RiskAnalyzer`] that bundles them into a [`RiskReport`].
//!
//! Conventions shared by every function:
//! - inputs are chronological `&[f64]` slices of per-period simple returns
//!   unless the name says prices or equity;
//! - VaR, CVaR and drawdown are positive loss fractions;
//! - undefined ratios (zero volatility, no drawdown) are `None`, never infinity.

pub mod drawdown;
pub mod error;
pub mod ratios;
pub mod report;
pub mod returns;
pub mod statistics;
pub mod var;

pub use drawdown::{drawdown_series, max_drawdown, max_drawdown_from_returns, DrawdownStats};
pub use error::RiskError;
pub use ratios::{annualized_return, annualized_volatility, calmar_ratio, sharpe_ratio, sortino_ratio};
pub use report::{RiskAnalyzer, RiskReport};
pub use returns::{cumulative_returns, log_returns, simple_returns};
pub use statistics::{
    beta, correlation_matrix, covariance, excess_kurtosis, mean, pearson_correlation, percentile,
    skewness, std_dev, variance,
};
pub use var::{conditional_var, historical_var, monte_carlo_var, parametric_var, scale_var};
