//! Health check route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::state::AppState;

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
}

/// Liveness: the process is up.
pub async fn health() -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: None,
    })
}

/// Readiness: the backend answers.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.backend().health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                backend: Some("ok"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Backend health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "degraded",
                    version: env!("CARGO_PKG_VERSION"),
                    backend: Some("unreachable"),
                }),
            )
        }
    }
}
