use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET / — liveness.
pub async fn liveness() -> &'static str {
    "Saathi API is running!"
}

/// GET /health — readiness, checks the datastore.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.health.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected" })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "db": "unavailable" })),
            )
        }
    }
}
