use crate::error::ApiError;
use crate::period::Period;
use crate::source::{start_of_day, MarketDataSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use configuration::ApiSettings;
use core_types::Kline;
use reqwest::StatusCode;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

// Intermediate structs for deserializing the v8 chart endpoint.
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteColumns {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

/// Daily history from the public Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("finscope/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.yahoo_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    #[instrument(skip(self))]
    async fn fetch_history(&self, symbol: &str, period: Period) -> Result<Vec<Kline>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let klines = parse_chart(symbol, status, &body)?;
        debug!(bars = klines.len(), "Parsed chart response");
        Ok(klines)
    }
}

/// Converts a chart response into bars. Rows with any missing field are
/// skipped, as the endpoint reports halted days with nulls.
///
/// A non-2xx status is always an `ApiError::Remote`, using the endpoint's own
/// error object when the body carries one.
pub fn parse_chart(symbol: &str, status: StatusCode, body: &str) -> Result<Vec<Kline>, ApiError> {
    let envelope = match serde_json::from_str::<ChartEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                error: status.canonical_reason().unwrap_or("Unknown error").to_string(),
                detail: body.to_string(),
            });
        }
        Err(e) => return Err(ApiError::Deserialization(e.to_string())),
    };

    if let Some(err) = envelope.chart.error {
        return Err(ApiError::Remote {
            status: status.as_u16(),
            error: err.code,
            detail: err.description,
        });
    }
    if !status.is_success() {
        return Err(ApiError::Remote {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown error").to_string(),
            detail: format!("chart request for {symbol} failed"),
        });
    }
    let result = envelope
        .chart
        .result
        .and_then(|mut r| (!r.is_empty()).then(|| r.swap_remove(0)))
        .ok_or_else(|| ApiError::NoData(symbol.to_string()))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let decimal = |v: f64| Decimal::from_f64(v).ok_or_else(|| ApiError::InvalidData(format!("{symbol}: {v}")));
    let mut klines = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            continue;
        };
        let timestamp = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| ApiError::InvalidData(format!("{symbol}: invalid timestamp {ts}")))?;
        klines.push(Kline {
            timestamp: start_of_day(timestamp),
            open: decimal(open)?,
            high: decimal(high)?,
            low: decimal(low)?,
            close: decimal(close)?,
            volume: decimal(volume)?,
        });
    }

    if klines.is_empty() {
        return Err(ApiError::NoData(symbol.to_string()));
    }
    Ok(klines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::ToPrimitive;

    const FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "currency": "USD"},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, null, 182.15],
                        "high": [188.44, 185.88, 183.09],
                        "low": [183.89, 183.43, 180.88],
                        "close": [185.64, 184.25, 181.91],
                        "volume": [82488700, 58414500, 71983600]
                    }],
                    "adjclose": [{"adjclose": [185.0, 183.6, 181.3]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_rows_and_skips_nulls() {
        let klines = parse_chart("AAPL", StatusCode::OK, FIXTURE).unwrap();
        assert_eq!(klines.len(), 2);
        assert_eq!(klines[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(klines[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap());
        assert!((klines[0].close.to_f64().unwrap() - 185.64).abs() < 1e-9);
        assert_eq!(klines[1].volume, Decimal::from(71983600));
    }

    #[test]
    fn surfaces_endpoint_errors() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        match parse_chart("NOPE", StatusCode::NOT_FOUND, body) {
            Err(ApiError::Remote { status, error, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(error, "Not Found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failed_status_is_remote_error_even_with_data() {
        match parse_chart("AAPL", StatusCode::TOO_MANY_REQUESTS, FIXTURE) {
            Err(ApiError::Remote { status, .. }) => assert_eq!(status, 429),
            other => panic!("unexpected {other:?}"),
        }
        match parse_chart("AAPL", StatusCode::BAD_GATEWAY, "<html>upstream</html>") {
            Err(ApiError::Remote { status, error, detail }) => {
                assert_eq!(status, 502);
                assert_eq!(error, "Bad Gateway");
                assert!(detail.contains("upstream"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_result_is_no_data() {
        let body = r#"{"chart": {"result": [], "error": null}}"#;
        assert!(matches!(parse_chart("X", StatusCode::OK, body), Err(ApiError::NoData(_))));
        assert!(matches!(parse_chart("X", StatusCode::OK, "not json"), Err(ApiError::Deserialization(_))));
    }
}
