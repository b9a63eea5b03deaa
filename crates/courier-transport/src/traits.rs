//! Transport abstraction traits.
//!
//! These traits define the dial-side seam between the connection lifecycle
//! manager and the underlying transport protocol, keeping the client
//! transport-agnostic.

use async_trait::async_trait;
use courier_protocol::Frame;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection timed out.
    #[error("Connection timed out")]
    Timeout,

    /// Failed to reach the endpoint.
    #[error("Dial failed: {0}")]
    Dial(String),

    /// Failed to send data.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to receive data.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Protocol error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] courier_protocol::ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// A transport that can open connections to a broker endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be reached or the
    /// transport-level handshake fails.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError>;

    /// Get the transport name (e.g., "websocket", "memory").
    fn name(&self) -> &'static str;

    /// Check if the transport is currently usable.
    fn is_available(&self) -> bool {
        true
    }
}

/// An open, framed, bidirectional connection to the broker.
///
/// A connection has exactly one owner (the connection driver task); all
/// methods take `&mut self`.
#[async_trait]
pub trait Connection: Send {
    /// Receive the next frame.
    ///
    /// Returns `None` if the connection was closed cleanly.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or malformed framing.
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError>;

    /// Send a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Close the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Get the remote address, if the transport knows one.
    fn remote_addr(&self) -> Option<String> {
        None
    }

    /// Check if the connection is still open.
    fn is_open(&self) -> bool;
}
