//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response structure.
///
/// The service is considered up whenever it can answer; store reachability
/// is reported separately.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "success": true,
    "message": "API is running",
    "database_connected": true
}))]
pub struct HealthResponse {
    pub success: bool,
    #[schema(example = "API is running")]
    pub message: String,
    /// Whether a connection could be acquired and accepted `SELECT 1`
    pub database_connected: bool,
}

impl HealthResponse {
    pub fn running(database_connected: bool) -> Self {
        Self {
            success: true,
            message: "API is running".to_string(),
            database_connected,
        }
    }
}
