//! Core domain models for Cache Refresher.

mod config;
mod notification;
mod payload;
mod status;

pub use config::{
    default_interval_ms, default_max_attempts, RefreshConfig, RefresherSettings, RestartPolicy,
};
pub use notification::{Notification, NotifyLevel};
pub use payload::{RefreshAck, RefreshPayload, CHAT_COMPLETION_API};
pub use status::{SchedulerPhase, SchedulerStatus};
