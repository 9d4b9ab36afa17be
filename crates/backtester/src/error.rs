use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Strategy execution error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),

    #[error("No price history was provided for the backtest.")]
    DataUnavailable,

    #[error("Price history is not in chronological order at bar {index}")]
    UnorderedData { index: usize },

    #[error("Bar {index} has a non-positive price or negative volume")]
    InvalidPrice { index: usize },
}

impl From<indicatif::style::TemplateError> for BacktestError {
    fn from(error: indicatif::style::TemplateError) -> Self {
        BacktestError::ProgressBarTemplate(error.to_string())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum PortfolioError {
    #[error("Not enough cash available to execute trade. Required: {required}, Available: {available}")]
    InsufficientCash { required: String, available: String },

    #[error("Position not found for symbol: {0}")]
    PositionNotFound(String),

    #[error("A position in {0} is already open")]
    PositionAlreadyOpen(String),

    #[error("Order quantity must be positive")]
    ZeroQuantity,
}
