//! HTTP server lifecycle: startup, serving and graceful shutdown.

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;

use crate::api::routes::create_router;
use crate::config::{Environment, Settings};
use crate::db::ConnectionProvider;
use crate::state::AppState;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Serves until Ctrl+C or SIGTERM.
    ///
    /// The pool connects lazily, so the server comes up while the database
    /// is down and `/health` reports it.
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_startup();

        let provider = ConnectionProvider::from_config(&self.settings.database);
        let router = self.router(AppState::new(provider, &self.settings.members));

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn router(&self, state: AppState) -> Router {
        let request_timeout = Duration::from_secs(self.settings.server.request_timeout);
        create_router(state).layer(TimeoutLayer::new(request_timeout))
    }

    // The database URL carries credentials and is never logged.
    fn log_startup(&self) {
        let Settings {
            application,
            server,
            database,
            members,
            ..
        } = &self.settings;

        tracing::info!(
            app_name = %application.name,
            app_version = %application.version,
            environment = %Environment::from_env(),
            host = %server.host,
            port = server.port,
            request_timeout = server.request_timeout,
            "Application starting"
        );
        tracing::info!(
            max_connections = database.max_connections,
            min_connections = database.min_connections,
            connection_timeout = database.connection_timeout,
            statement_timeout = database.statement_timeout,
            schema = %members.schema,
            table = %members.table,
            timestamp_column = %members.timestamp_column,
            max_batch_size = members.max_batch_size,
            "Member store configured"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutdown signal received, draining connections");
}
