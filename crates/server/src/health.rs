use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub dialog_id: String,
    pub devices_cached: usize,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Process readiness only. Deliberately probes nothing remote: a hung
/// upstream must not take the health endpoint down with it.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let devices_cached = state.devices.read().await.len();

    Json(HealthResponse {
        status: "ready",
        dialog_id: state.dialog_id.clone(),
        devices_cached,
        checked_at: Utc::now().to_rfc3339(),
    })
}
