//! # courier-transport
//!
//! Transport abstraction layer for the Courier messaging client.
//!
//! The connection lifecycle manager dials the broker through the
//! [`Connector`] trait and drives the resulting [`Connection`], keeping the
//! client transport-agnostic:
//!
//! - **WebSocket** - the standard transport (`tokio-tungstenite` dial)
//! - **Memory** - in-process transport for tests
//! - **Fallback** - ordered downgrade chain over other connectors
//!
//! ```rust,ignore
//! use courier_transport::{Connector, WebSocketConnector};
//!
//! let connector = WebSocketConnector::default();
//! let mut conn = connector.connect("ws://broker:8080/ws").await?;
//! conn.send(frame).await?;
//! ```

pub mod fallback;
pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use fallback::FallbackConnector;
pub use traits::{Connection, Connector, TransportError};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketConnector};
