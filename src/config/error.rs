//! Errors raised while loading or validating settings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required layer such as `default.toml` is absent.
    #[error("missing configuration file: {0}")]
    FileNotFound(String),

    /// The merged sources do not deserialize into [`crate::config::Settings`].
    #[error("unreadable configuration: {0}")]
    ParseError(String),

    /// `field` is the dotted key, e.g. `database.url`.
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("bad environment variable: {0}")]
    EnvVarError(String),

    /// Two settings that cannot be combined were both given.
    #[error("conflicting settings: {0}")]
    MutualExclusivityError(String),

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}
