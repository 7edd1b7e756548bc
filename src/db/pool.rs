//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bb8::CustomizeConnection;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, PoolError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::config::DatabaseConfig;

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
/// Structures holding AsyncDbPool can derive Clone without additional Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Creates the connection pool described by `config`.
///
/// The pool is built without opening a connection up front, so the process
/// starts even while the store is unreachable. Every checked-out connection
/// is tested with a ping first, and every new connection gets the server-side
/// `statement_timeout`.
///
/// Must be called inside a Tokio runtime; the pool spawns its idle-connection
/// replenishment task there.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&settings.database);
/// let mut conn = pool.get().await?;
/// ```
pub fn create_pool(config: &DatabaseConfig) -> AsyncDbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());

    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(config.connection_timeout())
        .test_on_check_out(true)
        .connection_customizer(Box::new(SessionSetup {
            statement_timeout: config.statement_timeout(),
        }))
        .build_unchecked(manager)
}

/// Session settings applied once to each newly opened connection.
///
/// The client-side deadline in `ConnectionProvider::within` only abandons the
/// future; the server keeps running the statement unless it has its own limit.
#[derive(Debug)]
struct SessionSetup {
    statement_timeout: Duration,
}

impl SessionSetup {
    fn statement_timeout_sql(&self) -> String {
        format!(
            "SET statement_timeout = {}",
            self.statement_timeout.as_millis()
        )
    }
}

impl CustomizeConnection<AsyncPgConnection, PoolError> for SessionSetup {
    fn on_acquire<'a>(
        &'a self,
        conn: &'a mut AsyncPgConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), PoolError>> + Send + 'a>> {
        Box::pin(async move {
            diesel::sql_query(self.statement_timeout_sql())
                .execute(conn)
                .await
                .map(|_| ())
                .map_err(PoolError::QueryError)
        })
    }
}
