use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("Invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid sentiment settings: {0}")]
    InvalidSettings(String),
}
