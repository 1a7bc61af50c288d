//! # chat-client
//!
//! Client side of the real-time chat: one session that owns the connection to
//! the chat server, tracks presence and typing indicators, and reports inbound
//! events to the UI through replaceable handlers.

pub mod connection;
pub mod handlers;
pub mod transport;

pub use connection::{AckHandler, ChatSession, ConnectionState, DeliveryError, SessionError};
pub use handlers::HandlerRegistry;
pub use transport::{
    AckId, Envelope, EventSender, Transport, TransportError, TransportEvent, TransportFactory, WsTransport,
    WsTransportFactory,
};
