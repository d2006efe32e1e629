//! Scheduler configuration and persisted settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Knobs the scheduler reads on every scheduling decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RefreshConfig {
    /// Cadence between attempts in milliseconds
    #[validate(range(min = 1_u64, message = "must be greater than zero"))]
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Attempt budget per cycle
    #[validate(range(min = 1_u32, message = "must be at least 1"))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Captures with fewer estimated prompt tokens are ignored
    #[serde(default = "default_min_tokens_floor")]
    pub min_tokens_floor: u32,
    /// Gate on notification sink calls
    #[serde(default = "default_true")]
    pub show_notifications: bool,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
            min_tokens_floor: default_min_tokens_floor(),
            show_notifications: true,
        }
    }
}

/// How `update_config` treats an active cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Start a fresh cycle at `max_attempts` with the new interval.
    #[default]
    Restart,
    /// Keep the remaining budget (clamped to the new maximum). The pending
    /// timer is re-armed only when the interval changed.
    KeepBudget,
}

/// Settings persisted by the host and restored on startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RefresherSettings {
    /// Refreshing is switched on
    #[serde(default)]
    pub enabled: bool,
    /// Cadence between attempts in milliseconds
    #[validate(range(min = 1_u64, message = "must be greater than zero"))]
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Attempt budget per cycle
    #[validate(range(min = 1_u32, message = "must be at least 1"))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Minimum estimated prompt size worth refreshing
    #[serde(default = "default_min_tokens_floor")]
    pub min_tokens_floor: u32,
    /// Show user-visible notifications
    #[serde(default = "default_true")]
    pub show_notifications: bool,
    /// Verbose diagnostic logging
    #[serde(default)]
    pub debug_mode: bool,
    /// `max_tokens` sent with each refresh so the replay stays cheap
    #[validate(range(min = 1_u32, message = "must be at least 1"))]
    #[serde(default = "default_refresh_max_tokens")]
    pub refresh_max_tokens: u32,
}

impl RefresherSettings {
    /// The part of the settings the scheduler consumes.
    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            interval_ms: self.interval_ms,
            max_attempts: self.max_attempts,
            min_tokens_floor: self.min_tokens_floor,
            show_notifications: self.show_notifications,
        }
    }

    /// Interval or budget differ, so an active cycle has to restart.
    pub fn changes_cycle(&self, other: &Self) -> bool {
        self.interval_ms != other.interval_ms || self.max_attempts != other.max_attempts
    }
}

impl Default for RefresherSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
            min_tokens_floor: default_min_tokens_floor(),
            show_notifications: true,
            debug_mode: false,
            refresh_max_tokens: default_refresh_max_tokens(),
        }
    }
}

// Default value functions
const fn default_true() -> bool {
    true
}

/// 4m30s: just under the common 5 minute prompt cache TTL.
pub const fn default_interval_ms() -> u64 {
    (5 * 60 - 30) * 1000
}

pub const fn default_max_attempts() -> u32 {
    3
}

const fn default_min_tokens_floor() -> u32 {
    1
}

const fn default_refresh_max_tokens() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings: RefresherSettings =
            serde_json::from_str(r#"{"enabled": true}"#).expect("partial settings parse");
        assert!(settings.enabled);
        assert_eq!(settings.interval_ms, 270_000);
        assert_eq!(settings.max_attempts, 3);
        assert!(settings.show_notifications);
        assert!(!settings.debug_mode);
    }

    #[test]
    fn test_validation_rejects_zero_budget() {
        let settings = RefresherSettings { max_attempts: 0, ..RefresherSettings::default() };
        assert!(settings.validate().is_err());

        let config = RefreshConfig { interval_ms: 0, ..RefreshConfig::default() };
        assert!(config.validate().is_err());
        assert!(RefreshConfig::default().validate().is_ok());
    }

    #[test]
    fn test_changes_cycle() {
        let base = RefresherSettings::default();
        let louder = RefresherSettings { show_notifications: false, ..base.clone() };
        let faster = RefresherSettings { interval_ms: 60_000, ..base.clone() };

        assert!(!base.changes_cycle(&louder));
        assert!(base.changes_cycle(&faster));
    }
}
