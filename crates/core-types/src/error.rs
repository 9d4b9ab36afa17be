use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Price {0} cannot be represented as a floating point number")]
    NonFinitePrice(String),
}
