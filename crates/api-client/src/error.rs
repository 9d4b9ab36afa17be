use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API returned {status}: {error} ({detail})")]
    Remote {
        status: u16,
        error: String,
        detail: String,
    },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from source: {0}")]
    InvalidData(String),

    #[error("No price data found for {0}")]
    NoData(String),

    #[error("Unknown period '{0}'; expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y, max")]
    InvalidPeriod(String),

    #[error("Optimization method '{0}' is not offered by the remote API; use max_sharpe, min_variance or risk_parity")]
    UnsupportedMethod(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
