//! Log filter that `debug_mode` can flip at runtime.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const DEBUG_FILTER: &str = "debug,hyper=info,reqwest=info";

#[derive(Clone)]
pub struct LogControl {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
    base_level: String,
}

impl LogControl {
    /// Install the global subscriber with `level` as the base filter.
    pub fn init(level: &str) -> Result<Self> {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let (filter_layer, handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_target(false))
            .try_init()?;

        Ok(Self { handle: Some(handle), base_level: level.to_string() })
    }

    /// Control not bound to any subscriber; `set_debug` is a no-op.
    pub fn detached() -> Self {
        Self { handle: None, base_level: "info".to_string() }
    }

    pub fn set_debug(&self, debug: bool) {
        let Some(handle) = &self.handle else {
            return;
        };

        let directives = if debug { DEBUG_FILTER } else { self.base_level.as_str() };
        let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));
        if let Err(e) = handle.reload(filter) {
            tracing::warn!("Failed to switch log filter: {}", e);
        }
    }
}
