//! Health check handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving.
    pub status: String,
    /// `"up"` or `"down"` depending on a live database round-trip.
    pub database: String,
    /// Crate version.
    pub version: String,
    /// Live WebSocket connections.
    pub ws_connections: usize,
}

/// GET /api/health
///
/// Always returns 200 while the process serves; a broken database is
/// reported in the body rather than as a failed request.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match cabby_database::connection::ping(&state.db_pool).await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed during health check");
            "down"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ws_connections: state.engine.manager().connection_count(),
    })
}
