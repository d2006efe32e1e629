use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cache_refresher_core::GenerationEvent;
use cache_refresher_types::{RefreshPayload, SchedulerStatus, CHAT_COMPLETION_API};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerationEndedRequest {
    #[serde(default = "default_api")]
    pub api: String,
    pub body: Value,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub chat_id: Option<String>,
}

fn default_api() -> String {
    CHAT_COMPLETION_API.to_string()
}

#[derive(Serialize)]
pub struct GenerationEndedResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: SchedulerStatus,
}

/// Host hook: a generation just finished with this request.
pub async fn generation_ended(
    State(state): State<AppState>,
    Json(request): Json<GenerationEndedRequest>,
) -> Json<GenerationEndedResponse> {
    let payload = RefreshPayload::new(request.api, request.body).with_dry_run(request.dry_run);
    let event = GenerationEvent { payload, chat_id: request.chat_id };

    let reason = state
        .inner
        .events
        .emit(&event)
        .into_iter()
        .find_map(Result::err)
        .map(|e| e.to_string());

    Json(GenerationEndedResponse {
        accepted: reason.is_none(),
        reason,
        status: state.scheduler().status(),
    })
}
