use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Identifies one of the built-in trading strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    #[serde(alias = "moving_average")]
    MACrossover,
    Rsi,
}

impl StrategyId {
    pub const ALL: [StrategyId; 2] = [StrategyId::MACrossover, StrategyId::Rsi];

    /// The name used on the command line and in the remote API.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyId::MACrossover => "moving_average",
            StrategyId::Rsi => "rsi",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "moving_average" | "ma_crossover" | "ma" => Ok(StrategyId::MACrossover),
            "rsi" => Ok(StrategyId::Rsi),
            other => Err(CoreError::InvalidInput(
                "strategy".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// The objective a portfolio optimization run solves for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    MaxSharpe,
    MinVariance,
    RiskParity,
    /// Minimum variance subject to an annualised expected return floor.
    TargetReturn(f64),
}

impl OptimizationMethod {
    /// The methods a comparison run evaluates.
    pub const COMPARED: [OptimizationMethod; 3] = [
        OptimizationMethod::MaxSharpe,
        OptimizationMethod::MinVariance,
        OptimizationMethod::RiskParity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizationMethod::MaxSharpe => "max_sharpe",
            OptimizationMethod::MinVariance => "min_variance",
            OptimizationMethod::RiskParity => "risk_parity",
            OptimizationMethod::TargetReturn(_) => "target_return",
        }
    }

    pub fn description(&self) -> String {
        match self {
            OptimizationMethod::MaxSharpe => "Maximum Sharpe Ratio".to_string(),
            OptimizationMethod::MinVariance => "Minimum Variance".to_string(),
            OptimizationMethod::RiskParity => "Risk Parity".to_string(),
            OptimizationMethod::TargetReturn(r) => format!("Target Return ({:.2}%)", r * 100.0),
        }
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl FromStr for OptimizationMethod {
    type Err = CoreError;

    /// Accepts `max_sharpe`, `min_variance`, `risk_parity` and `target:<return>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(target) = normalized
            .strip_prefix("target:")
            .or_else(|| normalized.strip_prefix("target_return:"))
        {
            let value = target.parse::<f64>().map_err(|_| {
                CoreError::InvalidInput("target return".to_string(), target.to_string())
            })?;
            return Ok(OptimizationMethod::TargetReturn(value));
        }
        match normalized.as_str() {
            "max_sharpe" => Ok(OptimizationMethod::MaxSharpe),
            "min_variance" => Ok(OptimizationMethod::MinVariance),
            "risk_parity" => Ok(OptimizationMethod::RiskParity),
            other => Err(CoreError::InvalidInput(
                "optimization method".to_string(),
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_id_accepts_api_and_cli_names() {
        assert_eq!("moving_average".parse::<StrategyId>().unwrap(), StrategyId::MACrossover);
        assert_eq!("ma-crossover".parse::<StrategyId>().unwrap(), StrategyId::MACrossover);
        assert_eq!("RSI".parse::<StrategyId>().unwrap(), StrategyId::Rsi);
        assert!("bollinger".parse::<StrategyId>().is_err());
    }

    #[test]
    fn optimization_method_parses_target_return() {
        assert_eq!(
            "target:0.12".parse::<OptimizationMethod>().unwrap(),
            OptimizationMethod::TargetReturn(0.12)
        );
        assert_eq!(
            "min-variance".parse::<OptimizationMethod>().unwrap(),
            OptimizationMethod::MinVariance
        );
        assert!("target:abc".parse::<OptimizationMethod>().is_err());
    }
}
