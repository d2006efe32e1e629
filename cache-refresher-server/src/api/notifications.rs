use axum::{extract::State, response::Json};
use serde::Serialize;

use cache_refresher_types::Notification;

use crate::state::AppState;

pub async fn list_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.inner.feed.recent())
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

pub async fn clear_notifications(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse { cleared: state.inner.feed.clear() })
}
