//! Application State
//!
//! Owns the scheduler, the host event bus and the persisted settings.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

use cache_refresher_core::notify::{FanoutNotifier, NotificationFeed, Notifier, TracingNotifier};
use cache_refresher_core::scheduler::{RefreshScheduler, TokioTimer};
use cache_refresher_core::transport::ChatCompletionTransport;
use cache_refresher_core::{GenerationEvents, SettingsStore};
use cache_refresher_types::{ConfigError, NotifyLevel, RefresherSettings, RestartPolicy};

use crate::logging::LogControl;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub scheduler: RefreshScheduler,
    pub events: GenerationEvents,
    pub feed: NotificationFeed,
    pub transport: Arc<ChatCompletionTransport>,
    pub store: SettingsStore,
    pub settings: RwLock<RefresherSettings>,
    pub log: LogControl,
}

impl AppState {
    /// Build the state from persisted settings and start the scheduler.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new_with_components(
        store: SettingsStore,
        transport: Arc<ChatCompletionTransport>,
        log: LogControl,
    ) -> Result<Self> {
        let settings = store.load()?;

        let feed = NotificationFeed::new();
        let notifier =
            FanoutNotifier::new().with(Arc::new(feed.clone())).with(Arc::new(TracingNotifier));

        let scheduler = RefreshScheduler::new(
            settings.refresh_config(),
            transport.clone(),
            Arc::new(notifier),
            Arc::new(TokioTimer::current()),
        )?;

        let events = GenerationEvents::new();
        scheduler.attach(&events);

        transport.set_max_tokens(settings.refresh_max_tokens);
        log.set_debug(settings.debug_mode);
        scheduler.set_enabled(settings.enabled);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                scheduler,
                events,
                feed,
                transport,
                store,
                settings: RwLock::new(settings),
                log,
            }),
        })
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.inner.scheduler
    }

    pub async fn settings(&self) -> RefresherSettings {
        self.inner.settings.read().await.clone()
    }

    /// User-visible notice, gated by `show_notifications`.
    pub async fn notify(&self, message: &str, level: NotifyLevel) {
        if self.inner.settings.read().await.show_notifications {
            self.inner.feed.notify(message, level);
        }
    }

    /// Switch refreshing on or off and persist the choice.
    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, ConfigError> {
        self.update_enabled(|_| enabled).await
    }

    /// Flip `enabled`, returning the new value.
    pub async fn toggle(&self) -> Result<bool, ConfigError> {
        self.update_enabled(|current| !current).await
    }

    async fn update_enabled(&self, f: impl FnOnce(bool) -> bool) -> Result<bool, ConfigError> {
        let mut settings = self.inner.settings.write().await;
        let enabled = f(settings.enabled);
        let next = RefresherSettings { enabled, ..settings.clone() };
        self.persist(&next).await?;
        let show = next.show_notifications;
        *settings = next;
        drop(settings);

        self.inner.scheduler.set_enabled(enabled);
        if show {
            let message =
                if enabled { "Cache refreshing enabled" } else { "Cache refreshing disabled" };
            self.inner.feed.notify(message, NotifyLevel::Info);
        }
        Ok(enabled)
    }

    /// Validate, persist and apply new settings.
    ///
    /// A changed interval or budget restarts an active cycle. Other changes
    /// leave the budget and the pending refresh where they are.
    pub async fn apply_settings(
        &self,
        next: RefresherSettings,
    ) -> Result<RefresherSettings, ConfigError> {
        let mut settings = self.inner.settings.write().await;
        self.persist(&next).await?;

        let policy = if next.changes_cycle(&settings) {
            RestartPolicy::Restart
        } else {
            RestartPolicy::KeepBudget
        };

        let scheduler = &self.inner.scheduler;
        if !next.enabled {
            scheduler.set_enabled(false);
        }
        scheduler.update_config(next.refresh_config(), policy)?;
        if next.enabled {
            scheduler.set_enabled(true);
        }

        self.inner.transport.set_max_tokens(next.refresh_max_tokens);
        self.inner.log.set_debug(next.debug_mode);

        *settings = next.clone();
        tracing::info!("[Settings] Applied ({:?})", policy);
        Ok(next)
    }

    async fn persist(&self, settings: &RefresherSettings) -> Result<(), ConfigError> {
        let store = self.inner.store.clone();
        let settings = settings.clone();
        match tokio::task::spawn_blocking(move || store.save(&settings)).await {
            Ok(result) => result,
            Err(e) => {
                Err(ConfigError::WriteError { message: format!("spawn_blocking panicked: {e}") })
            },
        }
    }
}
