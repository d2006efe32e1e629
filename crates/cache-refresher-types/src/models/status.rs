//! Scheduler status snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse scheduler state, derived from the live fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Refreshing is switched off
    Inactive,
    /// Enabled, waiting for a generation to capture
    Idle,
    /// A timer is pending for the next attempt
    Armed,
    /// An attempt is in flight
    Refreshing,
    /// Budget spent, waiting for the next capture
    Exhausted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub phase: SchedulerPhase,
    pub enabled: bool,
    pub has_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_api: Option<String>,
    pub attempts_remaining: u32,
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub busy: bool,
    pub armed: bool,
    /// Attempts completed since startup
    pub attempts_total: u64,
    pub successes: u64,
    pub failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl SchedulerStatus {
    /// One-line summary for status indicators and the CLI.
    pub fn summary(&self) -> String {
        match self.phase {
            SchedulerPhase::Inactive => "Inactive".to_string(),
            SchedulerPhase::Refreshing => "Refreshing cache...".to_string(),
            SchedulerPhase::Armed => {
                format!("Active - {} refreshes remaining", self.attempts_remaining)
            },
            SchedulerPhase::Idle | SchedulerPhase::Exhausted => {
                "Active - waiting for next generation".to_string()
            },
        }
    }
}
