//! Captured generation payload and refresh acknowledgement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API identifier for OpenAI-compatible chat completions.
pub const CHAT_COMPLETION_API: &str = "openai";

/// Request data captured from the last completed generation.
///
/// The scheduler never looks inside `body`; only the eligibility filter and
/// the transport do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshPayload {
    /// Protocol/API the request was sent with (e.g. `openai`)
    pub api: String,
    /// Request body exactly as the host sent it
    pub body: Value,
    /// Host marked this generation as a dry run (prompt inspection etc.)
    #[serde(default)]
    pub dry_run: bool,
}

impl RefreshPayload {
    pub fn new(api: impl Into<String>, body: Value) -> Self {
        Self { api: api.into(), body, dry_run: false }
    }

    /// Payload for an OpenAI-compatible chat completion body.
    pub fn chat_completion(body: Value) -> Self {
        Self::new(CHAT_COMPLETION_API, body)
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_chat_completion(&self) -> bool {
        self.api == CHAT_COMPLETION_API
    }

    /// Chat messages carried by the body, empty when absent.
    pub fn messages(&self) -> &[Value] {
        self.body.get("messages").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
    }

    /// True when there is nothing to replay: no messages and no text prompt.
    pub fn is_empty(&self) -> bool {
        let has_prompt =
            self.body.get("prompt").and_then(Value::as_str).is_some_and(|p| !p.trim().is_empty());
        self.messages().is_empty() && !has_prompt
    }

    /// Concatenated prompt text, used for size estimation.
    ///
    /// Handles plain string content and multi-part content (`{"type":"text"}`
    /// parts); other part types are skipped.
    pub fn prompt_text(&self) -> String {
        let mut text = String::new();

        if let Some(prompt) = self.body.get("prompt").and_then(Value::as_str) {
            text.push_str(prompt);
        }

        for message in self.messages() {
            match message.get("content") {
                Some(Value::String(s)) => {
                    push_line(&mut text, s);
                },
                Some(Value::Array(parts)) => {
                    for part in parts {
                        if let Some(s) = part.get("text").and_then(Value::as_str) {
                            push_line(&mut text, s);
                        }
                    }
                },
                _ => {},
            }
        }

        text
    }
}

fn push_line(buf: &mut String, s: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(s);
}

/// Successful refresh as reported by the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshAck {
    /// HTTP status returned by the upstream
    pub status: u16,
    /// Prompt tokens billed for the refresh, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Prompt tokens served from cache, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u32>,
}
