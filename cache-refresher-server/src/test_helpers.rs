//! Test helpers for cache-refresher-server unit tests.

use std::sync::Arc;

use tempfile::TempDir;

use cache_refresher_core::transport::ChatCompletionTransport;
use cache_refresher_core::SettingsStore;

use crate::logging::LogControl;
use crate::state::AppState;

/// Create a minimal `AppState` for testing.
///
/// Returns `(AppState, TempDir)`; keep `TempDir` alive for the test duration.
/// The transport points at a closed local port.
pub async fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = SettingsStore::new(temp_dir.path().join("settings.json"));
    let transport = Arc::new(ChatCompletionTransport::new(
        reqwest::Client::new(),
        "http://127.0.0.1:9/v1".to_string(),
        None,
    ));

    let state = AppState::new_with_components(store, transport, LogControl::detached())
        .expect("failed to create test AppState");

    (state, temp_dir)
}
