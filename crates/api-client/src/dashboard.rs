use crate::error::ApiError;
use crate::responses::*;
use configuration::ApiSettings;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Typed client for the remote analytics API.
#[derive(Clone)]
pub struct DashboardApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl DashboardApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()?,
            base_url: settings.dashboard_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(path, %status, "GET");
        decode(status, &text)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(path, %status, "POST");
        decode(status, &text)
    }

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get("/health").await
    }

    #[instrument(skip(self))]
    pub async fn market_data(&self, symbols: &[String], period: &str) -> Result<MarketDataResponse, ApiError> {
        let request = MarketDataRequest {
            symbols: symbols.to_vec(),
            period: period.to_string(),
        };
        self.post("/api/market-data", &request).await
    }

    pub async fn sentiment(&self, text: &str) -> Result<SentimentResponse, ApiError> {
        self.post("/api/sentiment", &SentimentRequest { text: text.to_string() }).await
    }

    pub async fn sentiment_batch(&self, texts: &[String]) -> Result<BatchSentimentResponse, ApiError> {
        self.post("/api/sentiment/batch", &BatchSentimentRequest { texts: texts.to_vec() })
            .await
    }

    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn optimize_portfolio(
        &self,
        request: &PortfolioOptimizationRequest,
    ) -> Result<PortfolioResponse, ApiError> {
        self.post("/api/portfolio/optimize", request).await
    }

    #[instrument(skip(self, request), fields(symbol = %request.symbol, strategy = %request.strategy))]
    pub async fn backtest(&self, request: &BacktestRequest) -> Result<BacktestResponse, ApiError> {
        self.post("/api/backtest", request).await
    }

    pub async fn strategies(&self) -> Result<Vec<StrategyDescriptor>, ApiError> {
        let response: StrategiesResponse = self.get("/api/strategies").await?;
        Ok(response.strategies)
    }

    pub async fn optimization_methods(&self) -> Result<Vec<MethodDescriptor>, ApiError> {
        let response: MethodsResponse = self.get("/api/optimization-methods").await?;
        Ok(response.methods)
    }
}

/// Decodes a success body into `T`, or any other status into `ApiError::Remote`.
pub(crate) fn decode<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ApiError> {
    if status.is_success() {
        return serde_json::from_str(text).map_err(|e| ApiError::Deserialization(e.to_string()));
    }
    let (error, detail) = match serde_json::from_str::<ApiErrorResponse>(text) {
        Ok(body) if !body.error.is_empty() => (body.error, body.detail),
        _ => (
            status.canonical_reason().unwrap_or("Unknown error").to_string(),
            text.to_string(),
        ),
    };
    Err(ApiError::Remote {
        status: status.as_u16(),
        error,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_portfolio_response() {
        let body = r#"{
            "method": "max_sharpe",
            "weights": {"AAPL": 0.6, "MSFT": 0.4},
            "expected_return": 0.18,
            "volatility": 0.22,
            "sharpe_ratio": 0.727,
            "optimization_time": 0.041
        }"#;
        let response: PortfolioResponse = decode(StatusCode::OK, body).unwrap();
        assert_eq!(response.weights["AAPL"], 0.6);
        assert_eq!(response.method, "max_sharpe");
    }

    #[test]
    fn decodes_strategy_listing() {
        let body = r#"{"strategies": [
            {"name": "moving_average", "description": "Moving Average Crossover Strategy", "parameters": ["short_window", "long_window"]},
            {"name": "rsi", "description": "RSI-based Strategy", "parameters": ["rsi_period", "oversold", "overbought"]}
        ]}"#;
        let response: StrategiesResponse = decode(StatusCode::OK, body).unwrap();
        assert_eq!(response.strategies.len(), 2);
        assert_eq!(response.strategies[1].parameters.len(), 3);
    }

    #[test]
    fn error_body_becomes_remote_error() {
        let body = r#"{"error": "Internal server error", "detail": "Error running backtest: no data"}"#;
        match decode::<HealthResponse>(StatusCode::INTERNAL_SERVER_ERROR, body) {
            Err(ApiError::Remote { status, error, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(error, "Internal server error");
                assert!(detail.contains("no data"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unstructured_error_keeps_raw_body() {
        match decode::<HealthResponse>(StatusCode::BAD_GATEWAY, "upstream down") {
            Err(ApiError::Remote { error, detail, .. }) => {
                assert_eq!(error, "Bad Gateway");
                assert_eq!(detail, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
