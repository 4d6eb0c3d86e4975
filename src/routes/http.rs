// Request handlers for the dashboard actions

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::monitor::MonitorError;
use crate::version::{NAME, VERSION};

/// Maps a monitor error to a status code and `{"error": "..."}` body.
fn error_response(err: MonitorError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        MonitorError::AlreadyConnected | MonitorError::NotConnected => StatusCode::CONFLICT,
        MonitorError::NoData(_) => StatusCode::NOT_FOUND,
        MonitorError::Transport(_) => StatusCode::BAD_GATEWAY,
        MonitorError::Persistence(_) | MonitorError::WriterClosed | MonitorError::Task(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/status: current counters, connection and recent activity.
pub(super) async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.dashboard())
}

pub(super) async fn connect_handler(State(state): State<AppState>) -> impl IntoResponse {
    state
        .monitor
        .connect()
        .await
        .map(Json)
        .map_err(error_response)
}

pub(super) async fn disconnect_handler(State(state): State<AppState>) -> impl IntoResponse {
    state
        .monitor
        .disconnect()
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /api/history/daily: every recorded day, oldest first.
pub(super) async fn daily_history_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.monitor.daily_history().map(Json).map_err(error_response)
}

/// GET /api/history/hourly: today's hour buckets.
pub(super) async fn hourly_history_handler(State(state): State<AppState>) -> impl IntoResponse {
    state
        .monitor
        .hourly_history_today()
        .map(Json)
        .map_err(error_response)
}

pub(super) async fn save_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.monitor.save_now().await {
        Ok(()) => {
            tracing::info!(operation = "save_now", "Parking data saved");
            Ok(Json(serde_json::json!({ "saved": true })))
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "save_now", "Manual save failed");
            Err(error_response(e))
        }
    }
}

pub(super) async fn clear_today_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.clear_today())
}
