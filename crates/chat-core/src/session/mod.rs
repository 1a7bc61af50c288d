//! Client session state
//!
//! The pieces of session state that have rules of their own: the presence
//! roster, typing countdowns and the reconnect policy.

mod presence;
mod retry;
mod typing;

pub use presence::PresenceCache;
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use typing::{
    Countdown, TypingState, AGENT_TYPING_DURATION, DEFAULT_TYPING_DURATION, MAX_TYPING_DURATION,
};
