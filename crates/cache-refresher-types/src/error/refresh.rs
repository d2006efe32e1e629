//! Refresh attempt and capture errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while capturing a payload or sending a refresh.
///
/// None of these are fatal: the scheduler reports them through the
/// notification sink and carries on with its fixed attempt budget.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum RefreshError {
    /// Captured payload is not worth refreshing (dry run, empty, too small)
    #[error("Ineligible payload: {reason}")]
    IneligiblePayload { reason: String },

    /// Transport returned an error or a non-success response
    #[error("{message}")]
    TransportFailure { message: String },

    /// Payload protocol is not one the transport can replay
    #[error("Unsupported API for cache refresh: {api}")]
    UnsupportedMode { api: String },

    /// Transport did not answer in time
    #[error("Refresh timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },
}

impl RefreshError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure { message: message.into() }
    }

    pub fn ineligible(reason: impl Into<String>) -> Self {
        Self::IneligiblePayload { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failure_displays_raw_message() {
        let err = RefreshError::transport("Overloaded");
        assert_eq!(err.to_string(), "Overloaded");
    }

    #[test]
    fn test_unsupported_mode_display() {
        let err = RefreshError::UnsupportedMode { api: "novel".to_string() };
        assert_eq!(err.to_string(), "Unsupported API for cache refresh: novel");
    }
}
