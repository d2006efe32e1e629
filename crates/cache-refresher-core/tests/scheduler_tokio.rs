#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration test: panics are the assertion mechanism")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cache_refresher_core::notify::NotificationFeed;
use cache_refresher_core::scheduler::{RefreshScheduler, TokioTimer};
use cache_refresher_core::transport;
use cache_refresher_types::{RefreshAck, RefreshConfig, RefreshError, RefreshPayload};
use serde_json::json;

fn payload() -> RefreshPayload {
    RefreshPayload::chat_completion(json!({
        "messages": [{"role": "user", "content": "keep me warm"}]
    }))
}

fn counting_scheduler(max_attempts: u32, interval_ms: u64) -> (RefreshScheduler, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let send = transport::from_fn(move |_payload: RefreshPayload| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, RefreshError>(RefreshAck { status: 200, ..RefreshAck::default() }) }
    });

    let scheduler = RefreshScheduler::new(
        RefreshConfig { interval_ms, max_attempts, ..RefreshConfig::default() },
        Arc::new(send),
        Arc::new(NotificationFeed::new()),
        Arc::new(TokioTimer::current()),
    )
    .expect("valid config");
    (scheduler, calls)
}

#[tokio::test(start_paused = true)]
async fn test_tokio_timer_runs_full_budget() {
    let (scheduler, calls) = counting_scheduler(3, 270_000);
    scheduler.set_enabled(true);
    scheduler.capture(payload()).expect("eligible");

    tokio::time::sleep(Duration::from_millis(269_000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(scheduler.status().attempts_remaining, 0);
    assert!(!scheduler.status().armed);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_timer_disable_aborts_sleep() {
    let (scheduler, calls) = counting_scheduler(3, 1_000);
    scheduler.set_enabled(true);
    scheduler.capture(payload()).expect("eligible");

    tokio::time::sleep(Duration::from_millis(500)).await;
    scheduler.set_enabled(false);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(scheduler.status().attempts_remaining, 3);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_timer_recapture_pushes_next_attempt() {
    let (scheduler, calls) = counting_scheduler(3, 1_000);
    scheduler.set_enabled(true);
    scheduler.capture(payload()).expect("eligible");

    tokio::time::sleep(Duration::from_millis(500)).await;
    scheduler.capture(payload()).expect("eligible");

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.status().attempts_remaining, 2);
}
