use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum IndicatorError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Not enough data: need {required} values, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Price conversion failed: {0}")]
    Price(String),
}

impl From<core_types::CoreError> for IndicatorError {
    fn from(error: core_types::CoreError) -> Self {
        IndicatorError::Price(error.to_string())
    }
}

pub(crate) fn require_period(name: &'static str, period: usize, min: usize) -> Result<(), IndicatorError> {
    if period < min {
        return Err(IndicatorError::InvalidParameter {
            name,
            reason: format!("must be at least {min}, got {period}"),
        });
    }
    Ok(())
}
