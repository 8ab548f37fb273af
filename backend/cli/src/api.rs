use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};

use dutybot_core::DutyRotation;

/// Shared application state for API handlers.
pub struct AppState {
    pub rotation: DutyRotation,
    pub started_at: Instant,
}

/// Build the Axum router: health endpoint plus the channel webhook routes.
pub fn build_router(state: Arc<AppState>, channel_router: Router) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .with_state(state)
        .merge(channel_router)
}

/// Health check endpoint, including who is on duty right now.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.rotation.snapshot_at(Utc::now());
    Json(json!({
        "status": "ok",
        "service": "dutybot",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "time_zone": state.rotation.time_zone().name(),
        "week": snapshot.week,
        "on_duty": snapshot.on_duty,
        "previous": snapshot.previous,
    }))
}
