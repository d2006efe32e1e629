//! Host event bus for "generation completed" notifications.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use cache_refresher_types::{RefreshError, RefreshPayload};

/// A generation finished on the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationEvent {
    /// Request the host sent for this generation
    pub payload: RefreshPayload,
    /// Host-side chat identifier, for logs only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

impl GenerationEvent {
    pub fn new(payload: RefreshPayload) -> Self {
        Self { payload, chat_id: None }
    }
}

type Handler = Box<dyn Fn(&GenerationEvent) -> Result<(), RefreshError> + Send + Sync>;

/// Synchronous handler registry.
///
/// Handlers run on the emitting thread in registration order and report
/// whether they accepted the event. A handler must not register further
/// handlers from inside `emit`.
#[derive(Default)]
pub struct GenerationEvents {
    handlers: RwLock<Vec<Handler>>,
}

impl GenerationEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_generation_complete(
        &self,
        handler: impl Fn(&GenerationEvent) -> Result<(), RefreshError> + Send + Sync + 'static,
    ) {
        self.handlers.write().push(Box::new(handler));
    }

    /// Deliver `event` to every handler, returning their outcomes in
    /// registration order.
    pub fn emit(&self, event: &GenerationEvent) -> Vec<Result<(), RefreshError>> {
        self.handlers.read().iter().map(|handler| handler(event)).collect()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl std::fmt::Debug for GenerationEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationEvents").field("handlers", &self.handler_count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_handlers_run_in_order() {
        let events = GenerationEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            events.on_generation_complete(move |_| {
                seen.lock().push(tag);
                Ok(())
            });
        }

        let event = GenerationEvent::new(RefreshPayload::chat_completion(json!({"messages": []})));
        assert_eq!(events.emit(&event).len(), 2);
        assert_eq!(*seen.lock(), vec!["first", "second"]);
        assert_eq!(events.handler_count(), 2);
    }

    #[test]
    fn test_emit_reports_rejections() {
        let events = GenerationEvents::new();
        events.on_generation_complete(|_| Ok(()));
        events.on_generation_complete(|event| {
            if event.payload.dry_run {
                Err(RefreshError::ineligible("dry run prompt"))
            } else {
                Ok(())
            }
        });

        let payload = RefreshPayload::chat_completion(json!({"messages": []}));
        let outcomes = events.emit(&GenerationEvent::new(payload.clone().with_dry_run(true)));
        assert_eq!(outcomes, vec![Ok(()), Err(RefreshError::ineligible("dry run prompt"))]);
        assert!(events.emit(&GenerationEvent::new(payload)).iter().all(Result::is_ok));
    }

    #[test]
    fn test_event_deserializes_without_chat_id() {
        let event: GenerationEvent = serde_json::from_value(json!({
            "payload": {"api": "openai", "body": {"messages": [{"role": "user", "content": "hi"}]}}
        }))
        .expect("valid event");
        assert!(event.chat_id.is_none());
        assert!(event.payload.is_chat_completion());
    }
}
