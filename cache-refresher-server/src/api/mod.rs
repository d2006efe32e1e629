//! API Routes
//!
//! REST endpoints for the host integration and the control panel.

mod events;
mod notifications;
mod settings;
mod status;

#[cfg(test)]
mod settings_tests;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Status
        .route("/status", get(status::get_status))
        // Host events
        .route("/events/generation-ended", post(events::generation_ended))
        // Enable / disable
        .route("/toggle", post(settings::toggle))
        .route("/enabled", post(settings::set_enabled))
        // Settings
        .route("/settings", get(settings::get_settings).post(settings::save_settings))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/clear", post(notifications::clear_notifications))
        // Captured payload
        .route("/reset", post(status::reset))
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}
