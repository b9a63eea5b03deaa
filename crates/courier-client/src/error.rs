//! Caller-visible error types.
//!
//! Only connection-level failures surface to callers; per-message decode
//! failures and handler faults are isolated inside dispatch and never
//! propagate. Errors are `Clone` because concurrent `connect()` callers
//! are coalesced onto a single attempt and all receive its outcome.

use courier_transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the client API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Socket or network-level failure.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The broker rejected the handshake.
    #[error("broker rejected connection ({code}): {message}")]
    Rejected {
        /// Broker error code.
        code: u16,
        /// Broker error message.
        message: String,
    },

    /// The broker negotiated a protocol version this client cannot speak.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    /// No CONNECTED frame arrived within the handshake timeout.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The payload could not be serialized for publishing.
    #[error("payload encoding failed: {0}")]
    Encode(String),

    /// The operation requires a live connection.
    #[error("not connected")]
    NotConnected,

    /// The reconnect attempt bound was exhausted; an explicit `connect()`
    /// is required to leave this state.
    #[error("reconnect attempts exhausted")]
    RetriesExhausted,

    /// The client was shut down (or disconnected while the call was
    /// pending).
    #[error("client closed")]
    Closed,
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_conversion() {
        let err: ClientError = TransportError::ConnectionClosed.into();
        assert_eq!(err, ClientError::Transport("Connection closed".to_string()));
    }

    #[test]
    fn test_display() {
        let err = ClientError::Rejected {
            code: 1401,
            message: "bad credentials".into(),
        };
        assert_eq!(
            err.to_string(),
            "broker rejected connection (1401): bad credentials"
        );
    }
}
