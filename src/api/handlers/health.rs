//! Health check endpoint handler.
//!
//! The endpoint always answers 200 while the process is serving; store
//! reachability is reported in the body so load balancers and humans can
//! tell "up but degraded" from "down".

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, response::Json};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates health check routes.
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(health_check))
}

/// Basic health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_connected = state.services.members.database_connected().await;
    Json(HealthResponse::running(database_connected))
}
