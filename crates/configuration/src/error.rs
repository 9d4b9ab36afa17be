use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error in [{section}]: {message}")]
    ValidationError { section: &'static str, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(section: &'static str, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            section,
            message: message.into(),
        }
    }
}
