use crate::error::StrategyError;
use crate::ma_crossover::MACrossover;
use crate::rsi_threshold::RsiThreshold;
use crate::Strategy;
use configuration::Config;
use core_types::StrategyId;
use serde::{Deserialize, Serialize};

/// Creates a new strategy instance based on the provided ID and configuration.
///
/// Parameters come from the `[strategies]` section of the config; the returned
/// strategy emits signals for `symbol`.
pub fn create_strategy(
    id: StrategyId,
    config: &Config,
    symbol: &str,
) -> Result<Box<dyn Strategy>, StrategyError> {
    // The compiler errors if a new StrategyId is added but not handled here.
    match id {
        StrategyId::MACrossover => {
            let params = config.strategies.ma_crossover.clone();
            Ok(Box::new(MACrossover::new(params, symbol.to_string())?))
        }
        StrategyId::Rsi => {
            let params = config.strategies.rsi.clone();
            Ok(Box::new(RsiThreshold::new(params, symbol.to_string())?))
        }
    }
}

/// A user-facing description of a built-in strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub id: StrategyId,
    pub name: String,
    pub description: String,
    pub parameters: Vec<String>,
}

/// Every strategy [`create_strategy`] can build.
pub fn available_strategies() -> Vec<StrategyInfo> {
    StrategyId::ALL
        .iter()
        .map(|id| {
            let (description, parameters): (&str, &[&str]) = match id {
                StrategyId::MACrossover => (
                    "Moving Average Crossover Strategy",
                    &["short_window", "long_window"],
                ),
                StrategyId::Rsi => ("RSI-based Strategy", &["period", "oversold", "overbought"]),
            };
            StrategyInfo {
                id: *id,
                name: id.name().to_string(),
                description: description.to_string(),
                parameters: parameters.iter().map(|p| p.to_string()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_listed_strategy_from_defaults() {
        let config = Config::default();
        for info in available_strategies() {
            let strategy = create_strategy(info.id, &config, "AAPL").unwrap();
            assert!(!strategy.name().is_empty());
        }
    }

    #[test]
    fn invalid_config_is_reported() {
        let mut config = Config::default();
        config.strategies.ma_crossover.short_window = 60;
        assert!(matches!(
            create_strategy(StrategyId::MACrossover, &config, "AAPL"),
            Err(StrategyError::InvalidParameters(_))
        ));
    }

    #[test]
    fn lists_api_names() {
        let names: Vec<String> = available_strategies().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["moving_average", "rsi"]);
    }
}
