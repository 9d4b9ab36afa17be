//! # API Client
//!
//! Everything that talks to the outside world for price data:
//! - [`MarketDataSource`], with the Yahoo chart endpoint ([`YahooClient`]) and
//!   local CSV exports ([`CsvSource`]) as implementations;
//! - [`fetch_many`] for bounded concurrent downloads of several symbols;
//! - [`DashboardApiClient`], a typed client for the remote analytics API.

pub mod csv_source;
pub mod dashboard;
pub mod error;
pub mod period;
pub mod responses;
pub mod source;
pub mod yahoo;

// --- Public API ---
pub use csv_source::{load_csv, load_csv_for_period, read_csv, CsvSource};
pub use dashboard::DashboardApiClient;
pub use error::ApiError;
pub use period::Period;
pub use responses::{
    ApiErrorResponse, BacktestRequest, BacktestResponse, BacktestTrade, BatchSentimentResponse,
    HealthResponse, MarketDataResponse, MethodDescriptor, PortfolioOptimizationRequest,
    PortfolioResponse, SentimentResponse, StrategyDescriptor,
};
pub use source::{clean_klines, fetch_many, MarketDataSource};
pub use yahoo::{parse_chart, YahooClient};
