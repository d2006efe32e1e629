//! # Cache Refresher Core
//!
//! Keeps an upstream prompt cache warm after a generation finishes.
//!
//! ```text
//! host ──GenerationEvent──▶ events ──▶ scheduler ──timer──▶ transport ──▶ upstream
//!                                          │
//!                                          └──▶ notify (feed / log)
//! ```
//!
//! The scheduler is driven by an injectable [`scheduler::Timer`]:
//! [`scheduler::TokioTimer`] in production, [`scheduler::ManualTimer`] for
//! deterministic tests.

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod eligibility;
pub mod error;
pub mod events;
pub mod modules;
pub mod notify;
pub mod scheduler;
pub mod transport;

pub use error::{AppError, AppResult};
pub use events::{GenerationEvent, GenerationEvents};
pub use modules::settings::{get_data_dir, SettingsStore};
pub use notify::{FanoutNotifier, NotificationFeed, Notifier, TracingNotifier};
pub use scheduler::{ManualTimer, RefreshScheduler, Timer, TimerHandle, TokioTimer};
pub use transport::{ChatCompletionTransport, RefreshTransport};
