use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};

use cache_refresher_types::{RefreshAck, RefreshError, RefreshPayload};

use super::RefreshTransport;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const UPSTREAM_URL_ENV: &str = "CACHE_REFRESHER_UPSTREAM_URL";

/// Pick the upstream base URL: explicit value, then env, then default.
///
/// Invalid values are logged and replaced by the default.
pub fn resolve_base_url(explicit: Option<String>) -> String {
    let (raw, source) = match explicit {
        Some(url) => (url, "argument"),
        None => match std::env::var(UPSTREAM_URL_ENV) {
            Ok(url) => (url, UPSTREAM_URL_ENV),
            Err(_) => return DEFAULT_BASE_URL.to_string(),
        },
    };

    let url = raw.trim().trim_end_matches('/').to_string();
    if url.is_empty() {
        tracing::warn!("[Transport] Upstream URL from {} is empty, using default", source);
        return DEFAULT_BASE_URL.to_string();
    }
    if url::Url::parse(&url).is_err() {
        tracing::warn!("[Transport] Upstream URL from {} is not a valid URL, using default", source);
        return DEFAULT_BASE_URL.to_string();
    }
    url
}

/// Replays OpenAI-compatible chat completion requests.
pub struct ChatCompletionTransport {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    /// `max_tokens` forced onto each refresh; 0 keeps the captured value.
    max_tokens: AtomicU32,
}

impl ChatCompletionTransport {
    /// Accepts a pre-built client so TLS setup happens outside the hot path.
    pub fn new(http_client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_tokens: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        self.max_tokens.store(max_tokens, Ordering::Relaxed);
        self
    }

    /// Change the forced `max_tokens` (hot-reloaded from settings).
    pub fn set_max_tokens(&self, max_tokens: u32) {
        self.max_tokens.store(max_tokens, Ordering::Relaxed);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(&self, payload: &RefreshPayload) -> Value {
        let mut body = payload.body.clone();
        if let Some(obj) = body.as_object_mut() {
            obj.insert("stream".to_string(), Value::Bool(false));
            obj.remove("stream_options");
            let max_tokens = self.max_tokens.load(Ordering::Relaxed);
            if max_tokens > 0 {
                obj.insert("max_tokens".to_string(), Value::from(max_tokens));
            }
        }
        body
    }
}

#[async_trait]
impl RefreshTransport for ChatCompletionTransport {
    async fn send_refresh(&self, payload: &RefreshPayload) -> Result<RefreshAck, RefreshError> {
        if !payload.is_chat_completion() {
            return Err(RefreshError::UnsupportedMode { api: payload.api.clone() });
        }

        let mut request = self.http_client.post(self.endpoint()).json(&self.build_body(payload));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            tracing::warn!("[Transport] Refresh rejected with HTTP {}", status.as_u16());
            return Err(RefreshError::transport(extract_error_message(&text)));
        }

        let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if json.get("error").is_some_and(|e| !e.is_null()) {
            return Err(RefreshError::transport(extract_error_message(&text)));
        }

        let usage = |pointer: &str| {
            json.pointer(pointer).and_then(Value::as_u64).and_then(|v| u32::try_from(v).ok())
        };

        Ok(RefreshAck {
            status: status.as_u16(),
            prompt_tokens: usage("/usage/prompt_tokens"),
            cached_tokens: usage("/usage/prompt_tokens_details/cached_tokens")
                .or_else(|| usage("/usage/cache_read_input_tokens")),
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> RefreshError {
    if e.is_timeout() {
        return RefreshError::transport(format!("request timed out: {}", e));
    }
    RefreshError::transport(e.to_string())
}

/// Upstream error text: `error.message`, a string `error`, the raw body, or
/// "Unknown error", in that order.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = json.get("error").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Overloaded","type":"server_error"}}"#),
            "Overloaded"
        );
        assert_eq!(extract_error_message(r#"{"error":"bad key"}"#), "bad key");
        assert_eq!(extract_error_message("  upstream exploded \n"), "upstream exploded");
        assert_eq!(extract_error_message(""), "Unknown error");
    }

    #[test]
    fn test_build_body_forces_non_streaming() {
        let transport =
            ChatCompletionTransport::new(Client::new(), "http://localhost/v1/".to_string(), None)
                .with_max_tokens(1);
        let payload = RefreshPayload::chat_completion(json!({
            "model": "gpt-4o",
            "stream": true,
            "stream_options": {"include_usage": true},
            "max_tokens": 800,
            "messages": [{"role": "user", "content": "hi"}]
        }));

        let body = transport.build_body(&payload);
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["max_tokens"], json!(1));
        assert!(body.get("stream_options").is_none());
        assert_eq!(transport.endpoint(), "http://localhost/v1/chat/completions");
    }

    #[test]
    fn test_build_body_keeps_max_tokens_without_override() {
        let transport =
            ChatCompletionTransport::new(Client::new(), DEFAULT_BASE_URL.to_string(), None);
        let payload = RefreshPayload::chat_completion(json!({
            "max_tokens": 800,
            "messages": [{"role": "user", "content": "hi"}]
        }));

        assert_eq!(transport.build_body(&payload)["max_tokens"], json!(800));
    }

    #[test]
    fn test_resolve_explicit_url() {
        assert_eq!(
            resolve_base_url(Some("http://127.0.0.1:5001/v1/".to_string())),
            "http://127.0.0.1:5001/v1"
        );
        assert_eq!(resolve_base_url(Some("not a url".to_string())), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(Some("   ".to_string())), DEFAULT_BASE_URL);
    }
}
