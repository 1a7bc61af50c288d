//! Connection session management
//!
//! Owns the single connection to the chat server and everything that hangs
//! off it: reconnect attempts, acknowledgments, presence and typing state.

mod error;
mod session;
mod state;

pub use error::{DeliveryError, SessionError};
pub use session::{AckHandler, ChatSession};
pub use state::ConnectionState;
