//! Request and response bodies of the remote analytics API.
//!
//! Field names follow the JSON contract exactly.

use crate::error::ApiError;
use core_types::OptimizationMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct MarketDataRequest {
    pub symbols: Vec<String>,
    pub period: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSentimentRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioOptimizationRequest {
    pub symbols: Vec<String>,
    pub risk_free_rate: f64,
    pub method: String,
}

impl PortfolioOptimizationRequest {
    /// The remote endpoint only knows the parameterless methods.
    pub fn new(symbols: Vec<String>, risk_free_rate: f64, method: OptimizationMethod) -> Result<Self, ApiError> {
        if !OptimizationMethod::COMPARED.contains(&method) {
            return Err(ApiError::UnsupportedMethod(method.name().to_string()));
        }
        Ok(Self {
            symbols,
            risk_free_rate,
            method: method.name().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestRequest {
    pub symbol: String,
    pub strategy: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub end_date: String,
    pub initial_cash: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// `data` holds symbols, per-symbol summaries and indicator snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataResponse {
    #[serde(default)]
    pub success: bool,
    pub data: serde_json::Value,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub text: String,
    pub sentiment: String,
    pub polarity: f64,
    pub confidence: f64,
    pub compound_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSentimentResponse {
    pub results: Vec<SentimentResponse>,
    pub summary: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub method: String,
    pub weights: BTreeMap<String, f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Seconds.
    pub optimization_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: i64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub holding_period: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResponse {
    pub strategy: String,
    pub symbol: String,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: u64,
    pub trades: Vec<BacktestTrade>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StrategiesResponse {
    pub strategies: Vec<StrategyDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MethodsResponse {
    pub methods: Vec<MethodDescriptor>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimization_request_carries_method_name() {
        let request =
            PortfolioOptimizationRequest::new(vec!["AAPL".into(), "MSFT".into()], 0.02, OptimizationMethod::RiskParity)
                .unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["method"], "risk_parity");
        assert_eq!(body["symbols"][1], "MSFT");
    }

    #[test]
    fn target_return_is_not_sent_remotely() {
        let result = PortfolioOptimizationRequest::new(vec!["AAPL".into()], 0.02, OptimizationMethod::TargetReturn(0.1));
        assert!(matches!(result, Err(ApiError::UnsupportedMethod(m)) if m == "target_return"));
    }
}
