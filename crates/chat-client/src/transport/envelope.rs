//! WebSocket frame format
//!
//! Each text frame carries one JSON envelope. Events name themselves in
//! `event`; acknowledgments carry only the `ack` id they answer.
//!
//! ```text
//! {"event": "send_message", "data": {...}, "ack": 7}   client -> server
//! {"event": "broadcast_message", "data": {...}}        server -> client
//! {"ack": 7, "data": {...}}                            server -> client
//! ```

use super::{AckId, TransportEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One WebSocket frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<AckId>,
}

impl Envelope {
    /// Create an event frame
    #[must_use]
    pub fn event(name: impl Into<String>, data: Value, ack: Option<AckId>) -> Self {
        Self {
            event: Some(name.into()),
            data,
            ack,
        }
    }

    /// Create an acknowledgment frame
    #[must_use]
    pub fn ack(id: AckId, data: Value) -> Self {
        Self {
            event: None,
            data,
            ack: Some(id),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Turn an inbound frame into a transport event
    ///
    /// Frames with neither an event name nor an ack id carry nothing usable.
    #[must_use]
    pub fn into_transport_event(self) -> Option<TransportEvent> {
        match (self.event, self.ack) {
            (Some(name), _) => Some(TransportEvent::Event {
                name,
                data: self.data,
            }),
            (None, Some(id)) => Some(TransportEvent::Ack {
                id,
                data: self.data,
            }),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.event, self.ack) {
            (Some(event), Some(ack)) => write!(f, "Envelope(event={event}, ack={ack})"),
            (Some(event), None) => write!(f, "Envelope(event={event})"),
            (None, Some(ack)) => write!(f, "Envelope(ack={ack})"),
            (None, None) => write!(f, "Envelope(empty)"),
        }
    }
}
