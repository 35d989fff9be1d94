use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the project root is an accessible directory.
    pub project_root_ok: bool,
}

/// GET /health -- returns service and project root health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let project_root_ok = tokio::fs::metadata(state.store.root())
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let status = if project_root_ok { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        project_root_ok,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
