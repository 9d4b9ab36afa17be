//! # Technical Indicators
//!
//! Closed-form technical analysis over closing-price series: moving averages,
//! RSI, MACD and Bollinger Bands, plus per-symbol snapshots and summaries.
//!
//! Batch functions take a chronological `&[f64]` and return a series of the
//! same length. Warm-up positions are `None` rather than a sentinel value.
//! [`RollingRsi`] is the streaming counterpart used by strategies.

pub mod error;
pub mod momentum;
pub mod moving_average;
pub mod snapshot;
pub mod volatility;

pub use error::IndicatorError;
pub use momentum::{macd, rsi, Macd, RollingRsi, RsiSmoothing};
pub use moving_average::{ema, sma};
pub use snapshot::{MarketSummary, TechnicalSnapshot};
pub use volatility::{bollinger_bands, BollingerBand};
