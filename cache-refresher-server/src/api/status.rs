use axum::{extract::State, response::Json};
use serde::Serialize;

use cache_refresher_types::SchedulerStatus;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: SchedulerStatus,
    /// Toolbar button text
    pub label: &'static str,
    /// Settings panel line
    pub summary: String,
    pub upstream: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.scheduler().status();
    let label = if status.enabled { "Cache Refresher: ON" } else { "Cache Refresher: OFF" };
    let summary = status.summary();

    Json(StatusResponse {
        status,
        label,
        summary,
        upstream: state.inner.transport.base_url().to_string(),
    })
}

/// Forget the captured payload and stop the current cycle.
pub async fn reset(State(state): State<AppState>) -> Json<SchedulerStatus> {
    state.scheduler().clear_payload();
    Json(state.scheduler().status())
}
