use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// Store rejections become [`AppError::Query`] with a sanitized reason, a
/// dropped connection becomes [`AppError::Connection`], and a result the
/// driver could not decode becomes [`AppError::Internal`].
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation)
            }
            DieselError::NotFound => AppError::not_found("resource", "id", "unknown"),
            DieselError::DeserializationError(source) => AppError::Internal {
                source: anyhow::anyhow!("malformed result during {}: {}", operation, source),
            },
            other => AppError::Query {
                operation: operation.to_string(),
                reason: other.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: Box<dyn diesel::result::DatabaseErrorInformation + Send + Sync>,
        operation: &str,
    ) -> AppError {
        let message = info.message().to_string();

        if matches!(
            kind,
            DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand
        ) {
            return AppError::Connection {
                source: anyhow::Error::msg(message),
            };
        }

        let reason =
            ConstraintParser::describe(&kind, &message, info.constraint_name(), info.column_name());

        tracing::debug!(
            operation = %operation,
            kind = ?kind,
            table = ?info.table_name(),
            constraint = ?info.constraint_name(),
            "Store rejected statement"
        );

        AppError::Query {
            operation: operation.to_string(),
            reason,
            source: anyhow::Error::msg(message),
        }
    }
}
