//! Notification sinks.
//!
//! The scheduler reports user-visible status through [`Notifier`]; the host
//! decides how to render it.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use cache_refresher_types::{Notification, NotifyLevel};

/// Receives user-visible status messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotifyLevel);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Error => tracing::error!("[Notify] {}", message),
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!("[Notify] {}", message),
        }
    }
}

const DEFAULT_FEED_CAPACITY: usize = 50;

/// Bounded in-memory feed of recent notifications, newest last.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    pub fn push(&self, notification: Notification) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    pub fn recent(&self) -> Vec<Notification> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all entries, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotificationFeed {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.push(Notification::new(level, message));
    }
}

/// Fans a notification out to several sinks.
#[derive(Default, Clone)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        for sink in &self.sinks {
            sink.notify(message, level);
        }
    }
}
