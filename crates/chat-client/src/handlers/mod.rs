//! UI-facing event handlers
//!
//! One slot per kind of update the session reports. Registering a handler
//! replaces whatever was in the slot before.

mod registry;

pub use registry::{
    AgentListHandler, HandlerRegistry, MessageHandler, PresenceHandler, TypingHandler,
};
