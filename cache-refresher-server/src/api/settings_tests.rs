use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::json;

use cache_refresher_types::{RefresherSettings, SchedulerPhase};

use super::events::{generation_ended, GenerationEndedRequest};
use super::settings::{get_settings, save_settings, set_enabled, toggle, SetEnabledRequest};
use crate::test_helpers::test_app_state;

fn capture_request() -> GenerationEndedRequest {
    GenerationEndedRequest {
        api: "openai".to_string(),
        body: json!({"messages": [{"role": "user", "content": "hello there"}]}),
        dry_run: false,
        chat_id: None,
    }
}

#[tokio::test]
async fn test_defaults_when_no_settings_file() {
    let (state, _tmp) = test_app_state().await;
    let Json(settings) = get_settings(State(state)).await;
    assert_eq!(settings, RefresherSettings::default());
}

#[tokio::test]
async fn test_toggle_persists() {
    let (state, _tmp) = test_app_state().await;

    let Json(response) = toggle(State(state.clone())).await.unwrap();
    assert!(response.enabled);
    assert!(state.scheduler().is_enabled());
    assert!(state.inner.store.load().unwrap().enabled);

    let Json(response) =
        set_enabled(State(state.clone()), Json(SetEnabledRequest { enabled: false }))
            .await
            .unwrap();
    assert!(!response.enabled);
    assert!(!state.inner.store.load().unwrap().enabled);
}

#[tokio::test]
async fn test_interval_change_restarts_cycle() {
    let (state, _tmp) = test_app_state().await;
    state.set_enabled(true).await.unwrap();
    let _ = generation_ended(State(state.clone()), Json(capture_request())).await;

    let next = RefresherSettings { enabled: true, max_attempts: 6, ..RefresherSettings::default() };
    let Json(saved) = save_settings(State(state.clone()), Json(next.clone())).await.unwrap();

    assert_eq!(saved, next);
    let status = state.scheduler().status();
    assert_eq!(status.attempts_remaining, 6);
    assert_eq!(status.phase, SchedulerPhase::Armed);
    assert_eq!(state.inner.store.load().unwrap(), next);
}

#[tokio::test]
async fn test_disabling_through_settings_stops_cycle() {
    let (state, _tmp) = test_app_state().await;
    state.set_enabled(true).await.unwrap();
    let _ = generation_ended(State(state.clone()), Json(capture_request())).await;

    let next = RefresherSettings { enabled: false, ..RefresherSettings::default() };
    save_settings(State(state.clone()), Json(next)).await.unwrap();

    let status = state.scheduler().status();
    assert!(!status.armed);
    assert!(status.has_payload);
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let (state, _tmp) = test_app_state().await;
    let bad = RefresherSettings { interval_ms: 0, ..RefresherSettings::default() };

    let (status, message) = save_settings(State(state.clone()), Json(bad)).await.unwrap_err();

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(message.contains("interval_ms"));
    assert_eq!(state.settings().await, RefresherSettings::default());
    assert!(!state.inner.store.path().exists());
}

#[tokio::test(start_paused = true)]
async fn test_non_timing_change_keeps_refresh_due() {
    let (state, _tmp) = test_app_state().await;
    let fast = RefresherSettings { enabled: true, interval_ms: 1_000, ..RefresherSettings::default() };
    save_settings(State(state.clone()), Json(fast.clone())).await.unwrap();
    let _ = generation_ended(State(state.clone()), Json(capture_request())).await;

    tokio::time::sleep(std::time::Duration::from_millis(900)).await;
    let debug = RefresherSettings { debug_mode: true, show_notifications: false, ..fast };
    save_settings(State(state.clone()), Json(debug)).await.unwrap();
    assert_eq!(state.scheduler().status().attempts_remaining, 3);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let status = state.scheduler().status();
    assert!(status.busy || status.attempts_total > 0, "refresh still due at t=1000: {:?}", status);
}
