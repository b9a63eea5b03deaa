//! # courier-client
//!
//! Resilient, multiplexed realtime messaging client.
//!
//! One physical broker connection carries any number of logical topic
//! subscriptions. Inbound messages fan out to every handler registered for
//! their topic; connection loss is recovered transparently by reconnecting
//! with linear backoff and replaying every registered subscription.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ commands ┌──────────────────┐  frames  ┌───────────┐
//! │ CourierClient│─────────▶│ Connection actor │◀────────▶│  Driver   │
//! │   (handles)  │          │  state machine   │          │ transport │
//! └──────────────┘          │  retry policy    │          └───────────┘
//!                           │  dispatch        │
//!                           └───────┬──────────┘
//!                      ┌────────────┴────────────┐
//!                      ▼                         ▼
//!               ┌──────────────┐        ┌──────────────────┐
//!               │ TopicRegistry│        │ SubscriptionTable│
//!               │ (persistent) │        │ (per connection) │
//!               └──────────────┘        └──────────────────┘
//! ```
//!
//! All state mutation is confined to the actor task; caller handles only
//! post commands into its mailbox, which makes subscription replay atomic
//! with respect to concurrent subscribe/unsubscribe calls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use courier_client::{handler_fn, ClientConfig, CourierClient};
//!
//! # async fn run() -> Result<(), courier_client::ClientError> {
//! let client = CourierClient::builder()
//!     .config(ClientConfig::default())
//!     .spawn();
//!
//! let handler = handler_fn(|payload| {
//!     println!("status changed: {payload}");
//! });
//! client.subscribe("status_C1001", handler);
//!
//! client.connect().await?;
//! client.publish("/app/chat/C1001", &serde_json::json!({ "type": "text" })).await?;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod connection;
pub mod credentials;
mod dispatch;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod registry;
pub mod subscription;
pub mod topic;

pub use client::{ClientBuilder, CourierClient};
pub use config::{ClientConfig, ConfigError, HeartbeatConfig, ReconnectConfig};
pub use connection::ConnectionState;
pub use credentials::{CredentialSource, NoCredentials, StaticCredentials};
pub use error::ClientError;
pub use handler::{handler_fn, HandlerRef, MessageHandler};
pub use registry::TopicRegistry;
pub use subscription::SubscriptionTable;
pub use topic::{ConsultationScheme, DestinationScheme, Topic, TopicPrefixScheme};
