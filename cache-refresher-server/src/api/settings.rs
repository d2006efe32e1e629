//! Settings and enable/disable handlers

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use cache_refresher_types::{ConfigError, NotifyLevel, RefresherSettings};

use crate::state::AppState;

pub async fn get_settings(State(state): State<AppState>) -> Json<RefresherSettings> {
    Json(state.settings().await)
}

pub async fn save_settings(
    State(state): State<AppState>,
    Json(payload): Json<RefresherSettings>,
) -> Result<Json<RefresherSettings>, (StatusCode, String)> {
    match state.apply_settings(payload).await {
        Ok(settings) => Ok(Json(settings)),
        Err(e) => Err(config_error(&state, e).await),
    }
}

#[derive(Serialize)]
pub struct EnabledResponse {
    pub enabled: bool,
}

#[derive(Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

pub async fn toggle(
    State(state): State<AppState>,
) -> Result<Json<EnabledResponse>, (StatusCode, String)> {
    match state.toggle().await {
        Ok(enabled) => Ok(Json(EnabledResponse { enabled })),
        Err(e) => Err(config_error(&state, e).await),
    }
}

pub async fn set_enabled(
    State(state): State<AppState>,
    Json(request): Json<SetEnabledRequest>,
) -> Result<Json<EnabledResponse>, (StatusCode, String)> {
    match state.set_enabled(request.enabled).await {
        Ok(enabled) => Ok(Json(EnabledResponse { enabled })),
        Err(e) => Err(config_error(&state, e).await),
    }
}

async fn config_error(state: &AppState, e: ConfigError) -> (StatusCode, String) {
    match e {
        ConfigError::ValidationError { .. } => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        _ => {
            tracing::error!("[Settings] Error saving settings: {}", e);
            state.notify("Error saving settings", NotifyLevel::Error).await;
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        },
    }
}
