use core_types::CoreError;
use risk::RiskError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("At least two assets are required, got {0}")]
    InsufficientAssets(usize),

    #[error("Need at least {required} aligned return observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Weight bounds [{min}, {max}] cannot sum to 1 across {assets} assets")]
    InfeasibleBounds { min: f64, max: f64, assets: usize },

    #[error("Target return {target:.4} exceeds the maximum attainable return {max:.4}")]
    UnreachableTarget { target: f64, max: f64 },

    #[error("Asset {0} has zero variance")]
    DegenerateAsset(String),

    #[error("Invalid optimizer input: {0}")]
    InvalidParameters(String),

    #[error("Price data error: {0}")]
    Data(#[from] CoreError),

    #[error("Risk calculation error: {0}")]
    Risk(#[from] RiskError),
}
