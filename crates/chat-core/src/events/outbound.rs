//! Payloads the client emits

use serde::{Deserialize, Serialize};

use super::TypingOrigin;

/// Typing hint, in seconds, sent with every local typing notification
pub const TYPING_HINT_SECS: u64 = 3;

/// `send_message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub message: String,
    pub token: String,
}

impl SendMessagePayload {
    #[must_use]
    pub fn new(message: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: token.into(),
        }
    }
}

/// `typing_event` payload emitted when the local user types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEventPayload {
    #[serde(rename = "type")]
    pub origin: TypingOrigin,
    pub duration: u64,
}

impl TypingEventPayload {
    /// Local human typing with the standard hint
    #[must_use]
    pub fn user() -> Self {
        Self {
            origin: TypingOrigin::User,
            duration: TYPING_HINT_SECS,
        }
    }
}
