use crate::error::ApiError;
use crate::period::Period;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::Kline;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

/// Anything that can produce a daily price history for a symbol.
///
/// Implementations return bars in chronological order, stamped at midnight UTC
/// of their trading date so histories of different symbols line up.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<Vec<Kline>, ApiError>;
}

/// Drops bars with non-positive prices or negative volume.
pub fn clean_klines(symbol: &str, klines: Vec<Kline>) -> Vec<Kline> {
    let before = klines.len();
    let cleaned: Vec<Kline> = klines.into_iter().filter(Kline::is_valid).collect();
    if cleaned.len() < before {
        warn!(symbol, dropped = before - cleaned.len(), "Removed invalid price rows");
    }
    cleaned
}

/// Truncates a timestamp to midnight UTC of the same day.
pub(crate) fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Fetches every symbol with at most `max_concurrency` requests in flight.
///
/// Results keep the order of `symbols`. A symbol that fails or comes back
/// empty is logged and left out.
pub async fn fetch_many<S: MarketDataSource + ?Sized>(
    source: &S,
    symbols: &[String],
    period: Period,
    max_concurrency: usize,
) -> Vec<(String, Vec<Kline>)> {
    let results: Vec<(String, Result<Vec<Kline>, ApiError>)> = stream::iter(symbols)
        .map(|symbol| async move { (symbol.clone(), source.fetch_history(symbol, period).await) })
        .buffered(max_concurrency.max(1))
        .collect()
        .await;

    let mut histories = Vec::with_capacity(results.len());
    for (symbol, result) in results {
        match result {
            Ok(klines) => {
                let klines = clean_klines(&symbol, klines);
                if klines.is_empty() {
                    warn!(%symbol, "No usable data");
                } else {
                    histories.push((symbol, klines));
                }
            }
            Err(e) => error!(%symbol, error = %e, "Failed to fetch history"),
        }
    }
    info!(requested = symbols.len(), fetched = histories.len(), "Fetched price histories");
    histories
}
