use std::borrow::Cow;

use axum::extract::rejection::JsonRejection;
use diesel_async::pooled_connection::PoolError;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::config::error::ConfigError;
use crate::error::DatabaseErrorConverter;

/// Application-wide error type.
///
/// The data-access layer converts every store-level failure into one of these
/// variants before returning, so callers never see a raw driver error.
#[derive(Error, Debug)]
pub enum AppError {
    /// The store could not be reached (network, authentication, pool exhausted)
    #[error("Database connection unavailable")]
    Connection {
        #[source]
        source: anyhow::Error,
    },

    /// The store rejected a statement (constraint violation, unknown column,
    /// type mismatch) or the statement could not be built
    #[error("Database query failed during {operation}: {reason}")]
    Query {
        operation: String,
        reason: String,
        #[source]
        source: anyhow::Error,
    },

    /// A statement did not finish within the configured timeout
    #[error("Database operation '{operation}' timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures and broken invariants
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn query(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        AppError::Query {
            operation: operation.into(),
            source: anyhow::Error::msg(reason.clone()),
            reason,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            source: anyhow::Error::msg(message.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<PoolError>> for AppError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        AppError::Connection {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "JSON data required: missing or invalid Content-Type header".to_string()
            }
            JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                format!("JSON data required: {}", rejection.body_text())
            }
            _ => "JSON data required".to_string(),
        };
        AppError::BadRequest { message }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut flattened = Vec::new();
        flatten_validation_errors(&errors, String::new(), &mut flattened);
        flattened.sort();
        match flattened.into_iter().next() {
            Some((field, reason)) => AppError::Validation { field, reason },
            None => AppError::validation("request", "validation failed"),
        }
    }
}

/// Walks nested and list validation errors, producing `(path, message)` pairs
/// such as `("members[1].name", "...")`.
fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: String,
    out: &mut Vec<(String, String)>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .clone()
                        .unwrap_or_else(|| Cow::Owned(format!("failed '{}' check", error.code)));
                    out.push((path.clone(), message.into_owned()));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
