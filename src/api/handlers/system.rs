//! System endpoints: health check and controller status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::domain::ControlMode;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
///
/// Healthy means the gateway is up; the robot link may still be down.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /status` — Link state, telemetry and controller flags.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.snapshot().await))
}

/// Control mode info.
#[derive(Debug, Serialize)]
struct ModeInfo {
    mode: ControlMode,
    locomotion: bool,
    joints: Option<(crate::domain::Joint, crate::domain::Joint)>,
}

/// `GET /config/modes` — List joystick control modes.
pub async fn modes_handler() -> impl IntoResponse {
    let modes: Vec<ModeInfo> = ControlMode::ALL
        .into_iter()
        .map(|mode| ModeInfo {
            mode,
            locomotion: mode.is_locomotion(),
            joints: mode.joints(),
        })
        .collect();
    (StatusCode::OK, Json(modes))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/modes", get(modes_handler))
}

/// Status route, mounted under `/api/v1`.
pub fn status_routes() -> Router<AppState> {
    Router::new().route("/status", get(status_handler))
}
