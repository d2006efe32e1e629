use chrono::{DateTime, Utc};
use std::sync::Arc;

use cache_refresher_types::{
    RefreshConfig, RefreshError, RefreshPayload, SchedulerPhase, SchedulerStatus,
};

use super::timer::TimerHandle;

pub(super) struct PendingTimer {
    pub id: u64,
    pub handle: TimerHandle,
}

#[derive(Debug, Default, Clone)]
pub(super) struct RefreshStats {
    pub attempts_total: u64,
    pub successes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl RefreshStats {
    pub fn record(&mut self, error: Option<&RefreshError>) {
        self.attempts_total = self.attempts_total.saturating_add(1);
        self.last_refresh_at = Some(Utc::now());
        match error {
            None => {
                self.successes = self.successes.saturating_add(1);
            },
            Some(e) => {
                self.failures = self.failures.saturating_add(1);
                self.last_error = Some(e.to_string());
            },
        }
    }
}

/// Mutable scheduler state. Invariant: `pending.is_some()` iff
/// `enabled && payload.is_some() && attempts_remaining > 0 && !busy()`.
pub(super) struct SchedulerState {
    pub config: RefreshConfig,
    pub enabled: bool,
    pub payload: Option<Arc<RefreshPayload>>,
    pub attempts_remaining: u32,
    /// Bumped on every restart or cancellation; stale attempts compare against it.
    pub cycle: u64,
    /// Cycle of the attempt currently holding the busy flag.
    pub in_flight: Option<u64>,
    pub pending: Option<PendingTimer>,
    pub next_timer_id: u64,
    pub stats: RefreshStats,
}

impl SchedulerState {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            config,
            enabled: false,
            payload: None,
            attempts_remaining: 0,
            cycle: 0,
            in_flight: None,
            pending: None,
            next_timer_id: 0,
            stats: RefreshStats::default(),
        }
    }

    pub fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn should_arm(&self) -> bool {
        self.enabled && self.payload.is_some() && self.attempts_remaining > 0 && !self.busy()
    }

    /// Cancel the pending timer, if any. Returns whether one was cancelled.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.cancel();
                true
            },
            None => false,
        }
    }

    pub fn take_timer_id(&mut self) -> u64 {
        let id = self.next_timer_id;
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        id
    }

    pub fn phase(&self) -> SchedulerPhase {
        if !self.enabled {
            SchedulerPhase::Inactive
        } else if self.busy() {
            SchedulerPhase::Refreshing
        } else if self.payload.is_none() {
            SchedulerPhase::Idle
        } else if self.pending.is_some() {
            SchedulerPhase::Armed
        } else {
            SchedulerPhase::Exhausted
        }
    }

    pub fn snapshot(&self) -> SchedulerStatus {
        SchedulerStatus {
            phase: self.phase(),
            enabled: self.enabled,
            has_payload: self.payload.is_some(),
            payload_api: self.payload.as_ref().map(|p| p.api.clone()),
            attempts_remaining: self.attempts_remaining,
            max_attempts: self.config.max_attempts,
            interval_ms: self.config.interval_ms,
            busy: self.busy(),
            armed: self.pending.is_some(),
            attempts_total: self.stats.attempts_total,
            successes: self.stats.successes,
            failures: self.stats.failures,
            last_error: self.stats.last_error.clone(),
            last_refresh_at: self.stats.last_refresh_at,
        }
    }
}
