//! # chat-core
//!
//! Domain layer for the chat client: the payloads exchanged with the chat server,
//! the local presence roster, typing countdowns, the reconnect retry policy and
//! the credential store contract.
//! This crate performs no I/O.

pub mod entities;
pub mod error;
pub mod events;
pub mod session;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{is_robot_action_message, robot_toggle_announcement, RoboChatter};
pub use error::DomainError;
pub use events::{
    AckPayload, BroadcastKind, BroadcastPayload, ChatEvent, ConnectSuccessPayload, ErrorPayload,
    InboundEvent, SendMessagePayload, SystemPayload, TypingEventPayload, TypingOrigin,
    TypingPayload,
};
pub use session::{
    Countdown, PresenceCache, RetryDecision, RetryPolicy, RetryState, TypingState,
    AGENT_TYPING_DURATION, DEFAULT_TYPING_DURATION, MAX_TYPING_DURATION,
};
pub use traits::{CredentialStore, AUTH_TOKEN_KEY, REFRESHED_TOKEN_KEY};
pub use value_objects::UserCount;
