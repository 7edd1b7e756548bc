//! Scoped access to pooled store connections.

use std::future::Future;
use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::bb8::PooledConnection;

use crate::config::DatabaseConfig;
use crate::db::pool::{AsyncDbPool, create_pool};
use crate::error::{AppError, AppResult, DatabaseErrorConverter};

/// One live connection, owned by the operation that acquired it.
///
/// Dropping the handle returns the connection to the pool, so release happens
/// on every exit path including errors, timeouts and cancelled futures.
pub type ConnectionHandle<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Hands out verified connections and bounds how long statements may run.
#[derive(Clone)]
pub struct ConnectionProvider {
    pool: AsyncDbPool,
    connection_timeout: Duration,
    statement_timeout: Duration,
}

impl ConnectionProvider {
    pub fn new(pool: AsyncDbPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            connection_timeout: config.connection_timeout(),
            statement_timeout: config.statement_timeout(),
        }
    }

    /// Builds the pool from configuration and wraps it.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(create_pool(config), config)
    }

    /// Acquires a connection using the configured acquisition timeout.
    pub async fn acquire(&self) -> AppResult<ConnectionHandle<'_>> {
        self.acquire_within(self.connection_timeout).await
    }

    /// Acquires a connection, giving up after `timeout`.
    ///
    /// Refused connections, authentication failures and timeouts all surface
    /// as [`AppError::Connection`]. No retry is attempted.
    pub async fn acquire_within(&self, timeout: Duration) -> AppResult<ConnectionHandle<'_>> {
        match tokio::time::timeout(timeout, self.pool.get()).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to acquire database connection");
                Err(AppError::from(e))
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Timed out acquiring database connection"
                );
                Err(AppError::Connection {
                    source: anyhow::anyhow!(
                        "no connection available within {}s",
                        timeout.as_secs()
                    ),
                })
            }
        }
    }

    /// Runs `work` under the statement timeout.
    ///
    /// On expiry the future is dropped, which also drops any connection it
    /// borrowed from its caller's scope once that scope ends.
    pub async fn within<T, F>(&self, operation: &str, work: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.statement_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = %operation,
                    timeout_secs = self.statement_timeout.as_secs(),
                    "Database operation timed out"
                );
                Err(AppError::Timeout {
                    operation: operation.to_string(),
                    seconds: self.statement_timeout.as_secs(),
                })
            }
        }
    }

    /// Acquires a connection and runs `SELECT 1` on it.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.acquire().await?;
        self.within("ping", ping_connection(&mut conn)).await
    }
}

async fn ping_connection(conn: &mut AsyncPgConnection) -> AppResult<()> {
    diesel::sql_query("SELECT 1")
        .execute(conn)
        .await
        .map(|_| ())
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "ping"))
}
