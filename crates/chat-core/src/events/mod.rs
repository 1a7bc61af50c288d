//! Chat events
//!
//! Named events exchanged with the chat server and their payload shapes.

mod event_types;
mod inbound;
mod outbound;

pub use event_types::{BroadcastKind, ChatEvent};
pub use inbound::{
    AckPayload, BroadcastPayload, ConnectSuccessPayload, ErrorPayload, InboundEvent,
    SystemPayload, TypingOrigin, TypingPayload,
};
pub use outbound::{SendMessagePayload, TypingEventPayload};
