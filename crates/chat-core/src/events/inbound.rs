//! Payloads the chat server pushes to the client

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{BroadcastKind, ChatEvent};
use crate::error::DomainError;
use crate::session::{DEFAULT_TYPING_DURATION, MAX_TYPING_DURATION};
use crate::value_objects::UserCount;

/// `broadcast_message` payload
///
/// Every field is optional: plain chat messages carry `message`, `user` and
/// `user_count`; presence changes add an `event` tag; rejected requests only
/// carry `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Counts that do not parse are dropped, not the whole payload
    #[serde(
        default,
        deserialize_with = "lenient_user_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_count: Option<UserCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BroadcastPayload {
    /// Create a plain chat message payload
    #[must_use]
    pub fn message(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            message: Some(text.into()),
            ..Self::default()
        }
    }

    /// Set the `event` tag
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Set the reported user count
    #[must_use]
    pub fn with_user_count(mut self, count: u32) -> Self {
        self.user_count = Some(UserCount::new(count));
        self
    }

    /// Classify the payload by its `event` tag
    #[must_use]
    pub fn kind(&self) -> BroadcastKind {
        BroadcastKind::from_tag(self.event.as_deref())
    }

    /// Reported user count as a plain number
    #[must_use]
    pub fn count(&self) -> Option<u32> {
        self.user_count.map(UserCount::get)
    }

    /// Check if the server flagged this broadcast as an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// `system_message` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl SystemPayload {
    /// Check if the server asks clients to re-fetch the robot roster
    #[must_use]
    pub fn requests_robot_refresh(&self) -> bool {
        BroadcastKind::from_tag(self.event.as_deref()) == BroadcastKind::RefreshRobots
    }
}

/// `connect_success` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectSuccessPayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// `connect_error` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
}

fn lenient_user_count<'de, D>(deserializer: D) -> Result<Option<UserCount>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value::<UserCount>(value.clone()) {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(user_count = %value, error = %e, "Ignoring unparseable user count");
            None
        }
    }))
}

/// Who is typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypingOrigin {
    /// A human chatter
    User,
    /// An automated chatter
    Robot,
}

/// `typing_event` payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypingPayload {
    #[serde(rename = "type")]
    pub origin: TypingOrigin,
    /// Indicator lifetime in seconds (human typing only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl TypingPayload {
    /// How long the indicator stays up
    ///
    /// Missing, negative or non-finite durations fall back to three seconds,
    /// and anything longer than an hour is capped.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self.duration.map(Duration::try_from_secs_f64) {
            Some(Ok(duration)) => duration.min(MAX_TYPING_DURATION),
            _ => DEFAULT_TYPING_DURATION,
        }
    }
}

/// Acknowledgment data returned for an emit that asked for one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckPayload {
    pub error: Option<String>,
}

impl AckPayload {
    /// Read an acknowledgment from whatever the server returned
    ///
    /// Anything other than an object with a non-null `error` counts as success.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let error = value.get("error").and_then(|e| match e {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });
        Self { error }
    }

    /// Check if the server reported a delivery failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A decoded server -> client event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ConnectSuccess(ConnectSuccessPayload),
    ConnectError(ErrorPayload),
    System(SystemPayload),
    Broadcast(BroadcastPayload),
    Typing(TypingPayload),
}

impl InboundEvent {
    /// Decode a named event and its JSON data
    pub fn decode(name: &str, data: Value) -> Result<Self, DomainError> {
        let event = ChatEvent::from_str(name)
            .filter(|e| e.is_inbound())
            .ok_or_else(|| DomainError::UnknownEvent(name.to_string()))?;

        // Events without a body arrive with null data
        let data = if data.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            data
        };

        let decoded = match event {
            ChatEvent::ConnectSuccess => serde_json::from_value(data).map(Self::ConnectSuccess),
            ChatEvent::ConnectError => serde_json::from_value(data).map(Self::ConnectError),
            ChatEvent::SystemMessage => serde_json::from_value(data).map(Self::System),
            ChatEvent::BroadcastMessage => serde_json::from_value(data).map(Self::Broadcast),
            ChatEvent::TypingEvent => serde_json::from_value(data).map(Self::Typing),
            ChatEvent::SendMessage => return Err(DomainError::UnknownEvent(name.to_string())),
        };

        decoded.map_err(|e| DomainError::invalid_payload(name, e))
    }

    /// The event this payload arrived as
    #[must_use]
    pub fn event(&self) -> ChatEvent {
        match self {
            Self::ConnectSuccess(_) => ChatEvent::ConnectSuccess,
            Self::ConnectError(_) => ChatEvent::ConnectError,
            Self::System(_) => ChatEvent::SystemMessage,
            Self::Broadcast(_) => ChatEvent::BroadcastMessage,
            Self::Typing(_) => ChatEvent::TypingEvent,
        }
    }
}
