//! Range and format checks run after all configuration layers are merged.
//!
//! Each check reports the first offending key as a dotted path.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, LoggerSettings, MembersConfig, ServerConfig, Settings,
};
use crate::db::is_valid_identifier;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];
const VALID_DATABASE_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

/// Fails with `field` when a numeric setting is zero.
fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::validation(field, "must be greater than 0"));
    }
    Ok(())
}

fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ConfigError> {
    if allowed.contains(&value.to_lowercase().as_str()) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("'{}' is not one of: {}", value, allowed.join(", ")),
    })
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("server.port", u64::from(self.port))?;
        require_positive("server.request_timeout", self.request_timeout)
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Set MEMBERS_DATABASE__URL or database.url in a local config file.",
            ));
        }
        if !VALID_DATABASE_SCHEMES
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ConfigError::validation(
                "database.url",
                "expected postgres://[user:password@]host[:port]/database",
            ));
        }

        require_positive("database.max_connections", u64::from(self.max_connections))?;
        require_positive("database.min_connections", u64::from(self.min_connections))?;
        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "{} exceeds database.max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        require_positive("database.connection_timeout", self.connection_timeout)?;
        require_positive("database.statement_timeout", self.statement_timeout)
    }
}

impl MembersConfig {
    /// Schema, table and timestamp column are spliced into SQL text, so each
    /// must be a plain identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("members.schema", &self.schema),
            ("members.table", &self.table),
            ("members.timestamp_column", &self.timestamp_column),
        ] {
            if !is_valid_identifier(value) {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "'{}' is not a valid identifier; use letters, digits and underscores, not starting with a digit",
                        value
                    ),
                });
            }
        }

        require_positive("members.max_batch_size", self.max_batch_size as u64)
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "required when file logging is enabled",
            ));
        }
        require_one_of("logger.file.format", &self.format, VALID_LOG_FORMATS)
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_one_of("logger.level", &self.level, VALID_LOG_LEVELS)?;
        self.file.validate()
    }
}

impl Settings {
    /// Validates every section, stopping at the first error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.members.validate()?;
        self.logger.validate()
    }
}
