//! Bounded periodic cache refresh.
//!
//! After a generation is captured the scheduler re-sends its payload every
//! `interval_ms`, at most `max_attempts` times, so the upstream prompt cache
//! does not expire while the user is idle.
//!
//! ```text
//! Idle ──capture──▶ Armed(max) ──timer──▶ Refreshing ──outcome──▶ Armed(n-1) | Exhausted
//!   ▲                  ▲                                                      │
//!   │                  └──────────────────── capture ─────────────────────────┘
//!   └──────────── disable (from any state, payload kept) ─────────────────────
//! ```
//!
//! - Exactly one timer is outstanding; the next one is armed only after the
//!   previous attempt's outcome has been processed.
//! - Success and failure both consume one attempt. There is no backoff.
//! - `capture`, `set_enabled` and `update_config` are synchronous and never
//!   interrupt an in-flight send. An attempt whose cycle was restarted or
//!   cancelled meanwhile completes, but its outcome is not charged to the new
//!   cycle.

mod state;
pub mod timer;


use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};
use validator::Validate;

use cache_refresher_types::{
    ConfigError, NotifyLevel, RefreshConfig, RefreshError, RefreshPayload, RestartPolicy,
    SchedulerStatus,
};

use crate::eligibility;
use crate::events::GenerationEvents;
use crate::notify::Notifier;
use crate::transport::RefreshTransport;

use state::{PendingTimer, SchedulerState};
pub use timer::{ManualTimer, Timer, TimerHandle, TimerTask, TokioTimer};

/// Upper bound on a single send before it counts as a failed attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

struct Inner {
    state: Mutex<SchedulerState>,
    transport: Arc<dyn RefreshTransport>,
    notifier: Arc<dyn Notifier>,
    timer: Arc<dyn Timer>,
    attempt_timeout: Duration,
    this: Weak<Inner>,
}

/// Handle to a refresh scheduler. Clones share the same instance.
///
/// Dropping the last handle cancels the pending timer.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    pub fn new(
        config: RefreshConfig,
        transport: Arc<dyn RefreshTransport>,
        notifier: Arc<dyn Notifier>,
        timer: Arc<dyn Timer>,
    ) -> Result<Self, ConfigError> {
        Self::with_attempt_timeout(config, transport, notifier, timer, DEFAULT_ATTEMPT_TIMEOUT)
    }

    pub fn with_attempt_timeout(
        config: RefreshConfig,
        transport: Arc<dyn RefreshTransport>,
        notifier: Arc<dyn Notifier>,
        timer: Arc<dyn Timer>,
        attempt_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        config.validate().map_err(|e| ConfigError::from_validation(&e))?;

        let inner = Arc::new_cyclic(|this| Inner {
            state: Mutex::new(SchedulerState::new(config)),
            transport,
            notifier,
            timer,
            attempt_timeout,
            this: this.clone(),
        });

        Ok(Self { inner })
    }

    /// Record a freshly completed generation and, if enabled, restart the cycle.
    ///
    /// Ineligible payloads are dropped without touching any state; the error
    /// is returned for diagnostics only.
    pub fn capture(&self, payload: RefreshPayload) -> Result<(), RefreshError> {
        let mut st = self.inner.state.lock();

        if let Err(e) = eligibility::check(&payload, st.config.min_tokens_floor) {
            debug!("[Scheduler] Capture ignored: {}", e);
            return Err(e);
        }

        st.payload = Some(Arc::new(payload));
        debug!("[Scheduler] Captured generation data");

        if st.enabled {
            self.inner.start_cycle(&mut st);
        }
        Ok(())
    }

    /// Switch refreshing on or off.
    ///
    /// Enabling with a stored payload starts a full cycle. Disabling cancels
    /// the pending timer and clears the busy flag but keeps the payload.
    pub fn set_enabled(&self, enabled: bool) {
        let mut st = self.inner.state.lock();

        if enabled {
            if st.enabled {
                return;
            }
            st.enabled = true;
            info!("[Scheduler] Cache refreshing enabled");
            if st.payload.is_some() {
                self.inner.start_cycle(&mut st);
            }
        } else {
            let was_enabled = std::mem::replace(&mut st.enabled, false);
            self.inner.stop_cycle(&mut st);
            if was_enabled {
                info!("[Scheduler] Cache refreshing disabled");
            }
        }
    }

    /// Replace interval/budget. See [`RestartPolicy`] for how an active cycle
    /// is treated.
    pub fn update_config(
        &self,
        config: RefreshConfig,
        policy: RestartPolicy,
    ) -> Result<(), ConfigError> {
        config.validate().map_err(|e| ConfigError::from_validation(&e))?;

        let mut st = self.inner.state.lock();
        let interval_changed = st.config.interval_ms != config.interval_ms;
        st.config = config;

        match policy {
            RestartPolicy::Restart => {
                if st.enabled && st.payload.is_some() {
                    debug!("[Scheduler] Config changed, restarting refresh cycle");
                    self.inner.start_cycle(&mut st);
                }
            },
            RestartPolicy::KeepBudget => {
                st.attempts_remaining = st.attempts_remaining.min(config.max_attempts);
                if interval_changed && st.cancel_pending() {
                    self.inner.arm(&mut st);
                }
            },
        }
        Ok(())
    }

    /// Drop the stored payload and cancel any pending attempt.
    pub fn clear_payload(&self) {
        let mut st = self.inner.state.lock();
        st.payload = None;
        self.inner.stop_cycle(&mut st);
        st.attempts_remaining = 0;
        debug!("[Scheduler] Generation data cleared");
    }

    /// Teardown: disable and cancel the pending timer.
    pub fn shutdown(&self) {
        let mut st = self.inner.state.lock();
        st.enabled = false;
        self.inner.stop_cycle(&mut st);
        debug!("[Scheduler] Shut down");
    }

    pub fn status(&self) -> SchedulerStatus {
        self.inner.state.lock().snapshot()
    }

    pub fn config(&self) -> RefreshConfig {
        self.inner.state.lock().config
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Route host "generation completed" events into [`capture`](Self::capture).
    ///
    /// The bus holds only a weak reference to the scheduler. The handler
    /// reports the capture outcome back to the emitter.
    pub fn attach(&self, events: &GenerationEvents) {
        let weak = Arc::downgrade(&self.inner);
        events.on_generation_complete(move |event| {
            let Some(inner) = weak.upgrade() else {
                return Ok(());
            };
            let scheduler = RefreshScheduler { inner };
            scheduler.capture(event.payload.clone()).inspect_err(|e| {
                debug!(
                    "[Scheduler] Generation {} not captured: {}",
                    event.chat_id.as_deref().unwrap_or("-"),
                    e
                );
            })
        });
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler").field("status", &self.status()).finish()
    }
}

impl Inner {
    fn start_cycle(&self, st: &mut SchedulerState) {
        st.cancel_pending();
        st.cycle = st.cycle.wrapping_add(1);
        st.attempts_remaining = st.config.max_attempts;
        self.arm(st);

        debug!(
            "[Scheduler] Refresh cycle started: {} refreshes, every {}ms",
            st.attempts_remaining, st.config.interval_ms
        );
    }

    fn stop_cycle(&self, st: &mut SchedulerState) {
        let cancelled = st.cancel_pending();
        if cancelled || st.busy() {
            st.cycle = st.cycle.wrapping_add(1);
        }
        st.in_flight = None;
        debug!("[Scheduler] Refresh cycle stopped");
    }

    /// Arm the next attempt if the state allows it and nothing is pending.
    fn arm(&self, st: &mut SchedulerState) {
        if st.pending.is_some() || !st.should_arm() {
            return;
        }

        let id = st.take_timer_id();
        let this = self.this.clone();
        let task = async move {
            if let Some(inner) = this.upgrade() {
                inner.tick(id).await;
            }
        }
        .boxed();

        let handle = self.timer.schedule_after(st.config.interval(), task);
        st.pending = Some(PendingTimer { id, handle });

        debug!("[Scheduler] Next refresh scheduled in {}ms", st.config.interval_ms);
    }

    async fn tick(&self, id: u64) {
        let (payload, cycle) = {
            let mut st = self.state.lock();

            if st.pending.as_ref().map(|p| p.id) != Some(id) {
                debug!("[Scheduler] Stale timer {} ignored", id);
                return;
            }
            st.pending = None;

            if !st.enabled || st.attempts_remaining == 0 || st.busy() {
                return;
            }
            let Some(payload) = st.payload.clone() else {
                return;
            };

            st.in_flight = Some(st.cycle);
            (payload, st.cycle)
        };

        debug!("[Scheduler] Refreshing cache ({} api)", payload.api);

        let outcome = match tokio::time::timeout(
            self.attempt_timeout,
            self.transport.send_refresh(&payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                Err(RefreshError::Timeout { duration_secs: self.attempt_timeout.as_secs() })
            },
        };

        let notification = {
            let mut st = self.state.lock();
            if st.in_flight == Some(cycle) {
                st.in_flight = None;
            }
            st.stats.record(outcome.as_ref().err());

            if st.cycle != cycle {
                debug!("[Scheduler] Cycle changed during refresh, outcome not counted");
                self.arm(&mut st);
                return;
            }

            st.attempts_remaining = st.attempts_remaining.saturating_sub(1);
            let remaining = st.attempts_remaining;
            let show = st.config.show_notifications;
            self.arm(&mut st);

            if remaining == 0 {
                debug!("[Scheduler] Refresh budget exhausted");
            }

            match &outcome {
                Ok(ack) => {
                    debug!(
                        "[Scheduler] Cache refreshed (status={}, cached_tokens={:?})",
                        ack.status, ack.cached_tokens
                    );
                    show.then(|| {
                        (
                            format!("Cache refreshed. {} refreshes remaining.", remaining),
                            NotifyLevel::Success,
                        )
                    })
                },
                Err(e) => {
                    warn!("[Scheduler] Cache refresh failed: {}", e);
                    show.then(|| (format!("Cache refresh failed: {}", e), NotifyLevel::Error))
                },
            }
        };

        if let Some((message, level)) = notification {
            self.notifier.notify(&message, level);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().cancel_pending();
    }
}
