use risk::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Equity curve is not in chronological order at index {0}")]
    UnorderedEquity(usize),

    #[error("Equity value cannot be represented as a float: {0}")]
    NonFiniteEquity(String),

    #[error("Initial equity must be positive, got {0}")]
    NonPositiveCapital(String),

    #[error("Risk calculation failed: {0}")]
    Risk(#[from] RiskError),
}
