//! Health check handler.

use crate::models::HealthResponse;
use axum::Json;
use tracing::instrument;

/// Handler for GET /v1/health
///
/// Liveness only: the service answers as long as it is running.
#[instrument(skip_all, name = "gallery.handlers.health")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
