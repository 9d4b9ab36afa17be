use core_types::CoreError;
use indicators::IndicatorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("An error occurred during indicator calculation: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Bar could not be evaluated: {0}")]
    Data(#[from] CoreError),
}
