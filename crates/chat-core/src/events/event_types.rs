//! Chat event names
//!
//! Event names used on the real-time channel, plus the `event` tags carried
//! inside broadcast and system payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named events on the real-time channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEvent {
    // Server -> client
    /// Handshake accepted by the server
    ConnectSuccess,
    /// Server rejected the handshake
    ConnectError,
    /// Out-of-band notification from the server
    SystemMessage,
    /// Chat message or presence change fanned out to every client
    BroadcastMessage,

    // Both directions
    /// Someone (human or robot) is typing
    TypingEvent,

    // Client -> server
    /// Outgoing chat message
    SendMessage,
}

impl ChatEvent {
    /// Get the wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectSuccess => "connect_success",
            Self::ConnectError => "connect_error",
            Self::SystemMessage => "system_message",
            Self::BroadcastMessage => "broadcast_message",
            Self::TypingEvent => "typing_event",
            Self::SendMessage => "send_message",
        }
    }

    /// Parse an event from its wire name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "connect_success" => Some(Self::ConnectSuccess),
            "connect_error" => Some(Self::ConnectError),
            "system_message" => Some(Self::SystemMessage),
            "broadcast_message" => Some(Self::BroadcastMessage),
            "typing_event" => Some(Self::TypingEvent),
            "send_message" => Some(Self::SendMessage),
            _ => None,
        }
    }

    /// Check if the server is allowed to send this event
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        !matches!(self, Self::SendMessage)
    }
}

impl fmt::Display for ChatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `event` tag inside a broadcast or system payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    /// A user joined the chat
    NewChatter,
    /// A user left the chat
    RemoveChatter,
    /// The robot roster changed and should be re-fetched
    RefreshRobots,
    /// Plain chat message (no tag, or a tag this client does not act on)
    Message,
}

impl BroadcastKind {
    /// Wire tag for presence join
    pub const NEW_CHATTER: &'static str = "new_chatter";
    /// Wire tag for presence leave
    pub const REMOVE_CHATTER: &'static str = "remove_chatter";
    /// Wire tag for a robot roster refresh request
    pub const REFRESH_ROBOTS: &'static str = "refresh_robots";

    /// Classify an optional `event` tag
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(Self::NEW_CHATTER) => Self::NewChatter,
            Some(Self::REMOVE_CHATTER) => Self::RemoveChatter,
            Some(Self::REFRESH_ROBOTS) => Self::RefreshRobots,
            _ => Self::Message,
        }
    }

    /// Check if this kind changes the presence roster
    #[must_use]
    pub const fn is_presence(self) -> bool {
        matches!(self, Self::NewChatter | Self::RemoveChatter)
    }
}
