use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RiskError {
    #[error("Insufficient data for {metric}: need at least {required} observations, got {available}")]
    InsufficientData {
        metric: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),

    #[error("Series lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Equity values must be positive; found {value} at index {index}")]
    NonPositiveEquity { index: usize, value: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameters(String),

    #[error("Distribution error: {0}")]
    Distribution(String),
}

pub(crate) fn require_len(metric: &'static str, values: &[f64], required: usize) -> Result<(), RiskError> {
    if values.len() < required {
        return Err(RiskError::InsufficientData {
            metric,
            required,
            available: values.len(),
        });
    }
    Ok(())
}

pub(crate) fn require_confidence(confidence: f64) -> Result<(), RiskError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(RiskError::InvalidConfidence(confidence));
    }
    Ok(())
}
