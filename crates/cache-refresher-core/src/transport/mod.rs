//! Refresh transports.
//!
//! The scheduler only sees [`RefreshTransport`]: it hands over the captured
//! payload and looks at nothing but the success/failure outcome.

mod chat_completion;

pub use chat_completion::{resolve_base_url, ChatCompletionTransport, DEFAULT_BASE_URL};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use cache_refresher_types::{RefreshAck, RefreshError, RefreshPayload};

use crate::error::AppResult;

/// Re-sends a captured payload upstream.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    async fn send_refresh(&self, payload: &RefreshPayload) -> Result<RefreshAck, RefreshError>;
}

/// Transport backed by an async closure.
pub struct FnTransport<F> {
    send: F,
}

/// Wrap an async closure as a transport.
pub fn from_fn<F, Fut>(send: F) -> FnTransport<F>
where
    F: Fn(RefreshPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RefreshAck, RefreshError>> + Send,
{
    FnTransport { send }
}

#[async_trait]
impl<F, Fut> RefreshTransport for FnTransport<F>
where
    F: Fn(RefreshPayload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RefreshAck, RefreshError>> + Send,
{
    async fn send_refresh(&self, payload: &RefreshPayload) -> Result<RefreshAck, RefreshError> {
        (self.send)(payload.clone()).await
    }
}

/// Build the HTTP client used for refresh requests.
pub fn build_http_client(timeout_secs: u64) -> AppResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(timeout_secs.max(5)))
        .tcp_nodelay(true)
        .build()?;
    Ok(client)
}
