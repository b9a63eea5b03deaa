//! Frame types for the Courier broker protocol.
//!
//! A session is a CONNECT/CONNECTED handshake followed by any number of
//! SUBSCRIBE, UNSUBSCRIBE, SEND and MESSAGE frames, interleaved with
//! PING/PONG heartbeats, and ends with DISCONNECT or an ERROR.

use serde::{Deserialize, Serialize};

/// Frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum FrameType {
    Connect = 0x01,
    Connected = 0x02,
    Subscribe = 0x03,
    Unsubscribe = 0x04,
    Send = 0x05,
    Message = 0x06,
    Error = 0x07,
    Ping = 0x08,
    Pong = 0x09,
    Disconnect = 0x0A,
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        ft as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(FrameType::Connect),
            0x02 => Ok(FrameType::Connected),
            0x03 => Ok(FrameType::Subscribe),
            0x04 => Ok(FrameType::Unsubscribe),
            0x05 => Ok(FrameType::Send),
            0x06 => Ok(FrameType::Message),
            0x07 => Ok(FrameType::Error),
            0x08 => Ok(FrameType::Ping),
            0x09 => Ok(FrameType::Pong),
            0x0A => Ok(FrameType::Disconnect),
            _ => Err("Invalid frame type"),
        }
    }
}

/// Error codes carried by [`Frame::Error`].
pub mod codes {
    /// Malformed or unexpected frame.
    pub const PROTOCOL: u16 = 1002;
    /// Broker is shutting down.
    pub const SHUTTING_DOWN: u16 = 1012;
    /// Handshake rejected: missing or invalid credentials.
    pub const UNAUTHORIZED: u16 = 1401;
    /// Destination does not exist or is not subscribable.
    pub const UNKNOWN_DESTINATION: u16 = 1404;
}

/// A protocol frame.
///
/// Frames are the messages exchanged between the client and the broker.
/// Message bodies are opaque bytes at this layer; the client decodes them
/// as UTF-8 JSON at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Open a session on a fresh transport connection.
    #[serde(rename = "connect")]
    Connect {
        /// Protocol version the client speaks.
        version: u8,
        /// Optional bearer credential; absent means unauthenticated.
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        /// Desired symmetric heartbeat interval in milliseconds (0 disables).
        heartbeat: u32,
    },

    /// Session established; broker's reply to `Connect`.
    #[serde(rename = "connected")]
    Connected {
        /// Broker-assigned session identifier.
        session: String,
        /// Negotiated protocol version.
        version: u8,
        /// Effective symmetric heartbeat interval in milliseconds.
        heartbeat: u32,
    },

    /// Open a wire subscription on a destination.
    #[serde(rename = "subscribe")]
    Subscribe {
        /// Opaque subscription handle; echoed back on `Message` frames.
        id: String,
        /// Destination path to subscribe to.
        destination: String,
    },

    /// Close a wire subscription.
    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        /// Handle of the subscription to close.
        id: String,
    },

    /// Publish a message to a destination (fire-and-forget).
    #[serde(rename = "send")]
    Send {
        /// Destination path.
        destination: String,
        /// Message body.
        #[serde(with = "serde_bytes")]
        body: Vec<u8>,
    },

    /// Inbound message delivery for one wire subscription.
    #[serde(rename = "message")]
    Message {
        /// Handle of the subscription this message was delivered on.
        subscription: String,
        /// Destination the message was published to.
        destination: String,
        /// Message body.
        #[serde(with = "serde_bytes")]
        body: Vec<u8>,
    },

    /// Fatal session error; the broker closes the connection after this.
    #[serde(rename = "error")]
    Error {
        /// Error code (see [`codes`]).
        code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Keepalive ping.
    #[serde(rename = "ping")]
    Ping,

    /// Keepalive pong.
    #[serde(rename = "pong")]
    Pong,

    /// Graceful session teardown.
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl Frame {
    /// Get the frame type.
    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Connect { .. } => FrameType::Connect,
            Frame::Connected { .. } => FrameType::Connected,
            Frame::Subscribe { .. } => FrameType::Subscribe,
            Frame::Unsubscribe { .. } => FrameType::Unsubscribe,
            Frame::Send { .. } => FrameType::Send,
            Frame::Message { .. } => FrameType::Message,
            Frame::Error { .. } => FrameType::Error,
            Frame::Ping => FrameType::Ping,
            Frame::Pong => FrameType::Pong,
            Frame::Disconnect => FrameType::Disconnect,
        }
    }

    /// Create a new Connect frame.
    #[must_use]
    pub fn connect(version: u8, token: Option<String>, heartbeat: u32) -> Self {
        Frame::Connect {
            version,
            token,
            heartbeat,
        }
    }

    /// Create a new Connected frame.
    #[must_use]
    pub fn connected(session: impl Into<String>, version: u8, heartbeat: u32) -> Self {
        Frame::Connected {
            session: session.into(),
            version,
            heartbeat,
        }
    }

    /// Create a new Subscribe frame.
    #[must_use]
    pub fn subscribe(id: impl Into<String>, destination: impl Into<String>) -> Self {
        Frame::Subscribe {
            id: id.into(),
            destination: destination.into(),
        }
    }

    /// Create a new Unsubscribe frame.
    #[must_use]
    pub fn unsubscribe(id: impl Into<String>) -> Self {
        Frame::Unsubscribe { id: id.into() }
    }

    /// Create a new Send frame.
    #[must_use]
    pub fn send(destination: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Frame::Send {
            destination: destination.into(),
            body: body.into(),
        }
    }

    /// Create a new Message frame.
    #[must_use]
    pub fn message(
        subscription: impl Into<String>,
        destination: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Frame::Message {
            subscription: subscription.into(),
            destination: destination.into(),
            body: body.into(),
        }
    }

    /// Create a new Error frame.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Frame::Error {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_type() {
        let connect = Frame::connect(1, None, 4000);
        assert_eq!(connect.frame_type(), FrameType::Connect);

        let subscribe = Frame::subscribe("sub-1", "/topic/status");
        assert_eq!(subscribe.frame_type(), FrameType::Subscribe);

        let message = Frame::message("sub-1", "/topic/status", b"{}".to_vec());
        assert_eq!(message.frame_type(), FrameType::Message);

        assert_eq!(Frame::Ping.frame_type(), FrameType::Ping);
        assert_eq!(Frame::Disconnect.frame_type(), FrameType::Disconnect);
    }

    #[test]
    fn test_frame_type_conversion() {
        for raw in 0x01..=0x0A {
            let ft = FrameType::try_from(raw).unwrap();
            assert_eq!(u8::from(ft), raw);
        }
        assert!(FrameType::try_from(0x00).is_err());
        assert!(FrameType::try_from(0x0B).is_err());
    }

    #[test]
    fn test_connect_without_token() {
        let frame = Frame::connect(1, None, 0);
        match frame {
            Frame::Connect {
                token, heartbeat, ..
            } => {
                assert!(token.is_none());
                assert_eq!(heartbeat, 0);
            }
            other => panic!("Expected Connect, got {other:?}"),
        }
    }
}
