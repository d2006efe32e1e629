//! # Cache Refresher Types
//!
//! Core types, models, and error definitions for Cache Refresher.
//!
//! - **`error`** - Typed errors for refresh attempts and configuration
//! - **`models`** - Domain models (payload, config, settings, status, notifications)
//!
//! ## Architecture Role
//!
//! ```text
//!          cache-refresher-types (this crate)
//!                        │
//!                        ▼
//!              cache-refresher-core
//!                        │
//!                        ▼
//!             cache-refresher-server
//! ```
//!
//! All types are serializable via serde so the server can hand them straight
//! to the HTTP API.

pub mod error;
pub mod models;

pub use error::{ConfigError, RefreshError};

pub use models::{
    Notification, NotifyLevel, RefreshAck, RefreshConfig, RefreshPayload, RefresherSettings,
    RestartPolicy, SchedulerPhase, SchedulerStatus, CHAT_COMPLETION_API,
};
