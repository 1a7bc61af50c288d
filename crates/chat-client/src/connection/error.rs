//! Session errors
//!
//! Every failure is logged where it happens. Callers get the same error back
//! and may ignore it.

use crate::transport::TransportError;

/// Why a session operation did nothing
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No auth token available")]
    MissingToken,

    #[error("Not connected to the chat server")]
    NotConnected,

    #[error("No active connection")]
    NoActiveConnection,

    #[error("No message to retry or token unavailable")]
    NothingToRetry,

    #[error("Reconnect attempts exhausted after {attempts} tries")]
    RetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SessionError {
    /// Check if the operation failed only because the session was not connected
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::NotConnected | Self::NoActiveConnection | Self::NothingToRetry
        )
    }
}

/// Why a sent message was not confirmed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Server rejected message: {0}")]
    Rejected(String),

    #[error("Connection closed before the server acknowledged the message")]
    ConnectionClosed,
}
