//! Domain errors - failures decoding what the chat server sends

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Decoding Errors
    // =========================================================================
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for '{event}': {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid user count: {0}")]
    InvalidUserCount(String),
}

impl DomainError {
    /// Create an invalid payload error for the named event
    pub fn invalid_payload(event: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidPayload {
            event: event.into(),
            source,
        }
    }

    /// Get error code for log fields
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEvent(_) => "UNKNOWN_EVENT",
            Self::InvalidPayload { .. } => "INVALID_PAYLOAD",
            Self::InvalidUserCount(_) => "INVALID_USER_COUNT",
        }
    }

    /// Check if the event name itself was not recognised
    #[must_use]
    pub fn is_unknown_event(&self) -> bool {
        matches!(self, Self::UnknownEvent(_))
    }
}
