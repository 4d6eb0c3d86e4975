// HTTP + WebSocket routes: the presentation layer's handles onto the monitor

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::monitor::ParkingMonitor;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) monitor: Arc<ParkingMonitor>,
}

pub fn app(monitor: Arc<ParkingMonitor>) -> Router {
    let state = AppState { monitor };
    Router::new()
        .route("/", get(|| async { "Smart parking monitor" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/status", get(http::status_handler)) // GET /api/status
        .route("/api/connect", post(http::connect_handler)) // POST /api/connect
        .route("/api/disconnect", post(http::disconnect_handler)) // POST /api/disconnect
        .route("/api/history/daily", get(http::daily_history_handler)) // GET /api/history/daily
        .route("/api/history/hourly", get(http::hourly_history_handler)) // GET /api/history/hourly
        .route("/api/save", post(http::save_handler)) // POST /api/save
        .route("/api/clear-today", post(http::clear_today_handler)) // POST /api/clear-today
        .route("/ws/dashboard", get(ws::ws_dashboard)) // WS /ws/dashboard
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
