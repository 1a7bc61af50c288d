//! Transport abstraction
//!
//! The session never talks to a socket directly. A `TransportFactory` opens a
//! `Transport` for a credential and pushes everything that happens on it into
//! the `EventSender` it was given; the session drains that channel one event
//! at a time.

mod envelope;
mod websocket;

pub use envelope::Envelope;
pub use websocket::{WsTransport, WsTransportFactory};

use serde_json::Value;
use tokio::sync::mpsc;

/// Identifier pairing an emit with its acknowledgment
pub type AckId = u64;

/// Channel the transport reports inbound events on
pub type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Everything a transport can report
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is established
    Connected,
    /// The connection went away
    Disconnected { reason: String },
    /// The connection could not be established
    ConnectFailed { error: String },
    /// A named event pushed by the server
    Event { name: String, data: Value },
    /// The server acknowledged an emit
    Ack { id: AckId, data: Value },
}

impl TransportEvent {
    /// Shorthand for a named server event
    pub fn event(name: impl Into<String>, data: Value) -> Self {
        Self::Event {
            name: name.into(),
            data,
        }
    }
}

/// A live (or connecting) link to the chat server
pub trait Transport: Send {
    /// Check if the link is currently usable
    fn is_connected(&self) -> bool;

    /// Emit a named event, optionally asking for an acknowledgment
    fn emit(&mut self, event: &str, data: Value, ack: Option<AckId>) -> Result<(), TransportError>;

    /// Close the link. Calling it twice is harmless.
    fn disconnect(&mut self);
}

/// Opens transports
pub trait TransportFactory: Send {
    type Transport: Transport;

    /// Start connecting with `credential`; progress is reported on `events`
    fn connect(
        &mut self,
        credential: &str,
        events: EventSender,
    ) -> Result<Self::Transport, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}
