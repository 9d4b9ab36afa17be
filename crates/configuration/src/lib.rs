use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ApiSettings, Config, LoggingSettings, MACrossoverParams, PortfolioSettings, RiskSettings, RsiParams,
    SentimentSettings, Simulation, Strategies,
};

/// Prefix for environment overrides, e.g. `FINSCOPE__RISK__CONFIDENCE_LEVEL=0.99`.
pub const ENV_PREFIX: &str = "FINSCOPE";

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file at `path` (if it
/// exists), then `FINSCOPE__SECTION__KEY` environment variables. The result is
/// validated before it is returned.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Parses configuration from TOML text without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config = load_config_from_str(
            r#"
            [simulation]
            commission_pct = 0.002

            [strategies.ma_crossover]
            short_window = 10

            [risk]
            confidence_level = 0.99
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.commission_pct, dec!(0.002));
        assert_eq!(config.simulation.initial_capital, dec!(100000));
        assert_eq!(config.strategies.ma_crossover.short_window, 10);
        assert_eq!(config.strategies.ma_crossover.long_window, 50);
        assert_eq!(config.risk.confidence_level, 0.99);
        assert_eq!(config.portfolio.risk_free_rate, 0.02);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let result = load_config_from_str(
            r#"
            [simulation]
            position_fraction = 1.5
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("definitely-not-here.toml").unwrap();
        assert_eq!(config.strategies.rsi.period, 14);
    }
}
