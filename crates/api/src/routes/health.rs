use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` or `unhealthy`.
    pub status: &'static str,
}

/// GET /health -- 200 when the database answers, 500 otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.usecases.health.check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok" })),
        Err(err) => {
            tracing::error!(error = %err, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                }),
            )
        }
    }
}

/// Mount health check routes at the root.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
