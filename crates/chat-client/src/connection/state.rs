//! Connection state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the session stands with the chat server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No usable connection
    #[default]
    Disconnected,
    /// Transport created, waiting for the server to accept it
    Connecting,
    /// Connection established
    Connected,
    /// Reconnect attempts are spent; only an explicit connect leaves this state
    Failed,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
