//! # courier-protocol
//!
//! Wire protocol definitions for the Courier realtime messaging client.
//!
//! This crate defines the framed binary protocol spoken between a Courier
//! client and its broker: frame types, the length-prefixed MessagePack codec,
//! and protocol versioning.
//!
//! ## Frame Types
//!
//! - `Connect` / `Connected` - session handshake with heartbeat negotiation
//! - `Subscribe` / `Unsubscribe` - wire subscription management
//! - `Send` - publish a message to a destination
//! - `Message` - inbound delivery for one subscription
//! - `Error` / `Ping` / `Pong` / `Disconnect`
//!
//! ## Example
//!
//! ```rust
//! use courier_protocol::{codec, Frame};
//!
//! let frame = Frame::subscribe("sub-1", "/topic/consultation/status/C1001");
//!
//! let encoded = codec::encode(&frame).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(frame, decoded);
//! ```

pub mod codec;
pub mod frames;
pub mod version;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{codes, Frame, FrameType};
pub use version::{is_supported, MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};
