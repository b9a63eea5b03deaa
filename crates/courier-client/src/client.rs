//! The caller-facing client handle.
//!
//! [`CourierClient`] is a cheap, cloneable handle to one connection actor;
//! construct it once at application startup and pass clones to every
//! consumer. Dropping the last handle shuts the actor down.

use std::sync::Arc;

use courier_transport::Connector;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};

use crate::config::ClientConfig;
use crate::connection::{Command, ConnectionActor, ConnectionState};
use crate::credentials::{CredentialSource, NoCredentials};
use crate::error::ClientError;
use crate::handler::HandlerRef;
use crate::registry::TopicRegistry;
use crate::subscription::SubscriptionTable;
use crate::topic::{DestinationScheme, Topic, TopicPrefixScheme};

/// Builder for [`CourierClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    scheme: Arc<dyn DestinationScheme>,
    credentials: Arc<dyn CredentialSource>,
}

impl ClientBuilder {
    fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: None,
            scheme: Arc::new(TopicPrefixScheme::default()),
            credentials: Arc::new(NoCredentials),
        }
    }

    /// Set the client configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the transport connector.
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Set the topic-to-destination scheme.
    #[must_use]
    pub fn destination_scheme(mut self, scheme: Arc<dyn DestinationScheme>) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the credential source consulted at connect time.
    #[must_use]
    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Spawn the connection actor and return its handle.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> CourierClient {
        #[cfg(feature = "websocket")]
        let connector = self.connector.unwrap_or_else(|| {
            Arc::new(courier_transport::WebSocketConnector::default())
        });
        #[cfg(not(feature = "websocket"))]
        let connector = self
            .connector
            .expect("a connector is required without the websocket feature");

        let registry = Arc::new(TopicRegistry::new());
        let table = Arc::new(SubscriptionTable::new());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let actor = ConnectionActor::new(
            self.config,
            connector,
            self.scheme,
            self.credentials,
            Arc::clone(&registry),
            Arc::clone(&table),
            state_tx,
            commands_rx,
        );
        tokio::spawn(actor.run());

        CourierClient {
            commands: commands_tx,
            state: state_rx,
            registry,
        }
    }
}

/// Handle to a Courier connection.
///
/// All methods are safe to call from any task; calls are serialized through
/// the connection actor's mailbox.
#[derive(Clone)]
pub struct CourierClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    registry: Arc<TopicRegistry>,
}

impl CourierClient {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Connect to the broker, or return immediately if already connected.
    ///
    /// Concurrent calls are coalesced onto one attempt and share its
    /// outcome. On success the previous subscriptions are already replayed
    /// by the time this resolves.
    ///
    /// # Errors
    ///
    /// Returns the handshake or transport failure of the attempt.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Connect { reply: reply_tx })
            .map_err(|_| ClientError::Closed)?;
        reply_rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Disconnect and cancel any scheduled reconnect attempts.
    ///
    /// Registered handlers are kept; a later [`connect`](Self::connect)
    /// replays them onto fresh wire subscriptions.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Register a handler for a topic.
    ///
    /// Never fails and never blocks: when not connected, the registration
    /// is recorded and wired in on the next successful connect. Multiple
    /// handlers share one wire subscription per topic; re-registering the
    /// same handler is a no-op.
    pub fn subscribe(&self, topic: impl Into<Topic>, handler: HandlerRef) {
        let _ = self.commands.send(Command::Subscribe {
            topic: topic.into(),
            handler,
        });
    }

    /// Remove a handler from a topic.
    ///
    /// When the last handler for the topic is removed, its wire
    /// subscription is closed. Unknown topics and unknown handlers are
    /// no-ops.
    pub fn unsubscribe(&self, topic: impl Into<Topic>, handler: &HandlerRef) {
        let _ = self.commands.send(Command::Unsubscribe {
            topic: topic.into(),
            handler: Arc::clone(handler),
        });
    }

    /// Publish a message to a destination (fire-and-forget).
    ///
    /// The client neither queues nor retries; retry policy belongs to the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] when there is no live
    /// connection, and [`ClientError::Encode`] if the payload cannot be
    /// serialized.
    pub async fn publish<T>(
        &self,
        destination: impl Into<String>,
        message: &T,
    ) -> Result<(), ClientError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(message).map_err(|e| ClientError::Encode(e.to_string()))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Publish {
                destination: destination.into(),
                body,
                reply: reply_tx,
            })
            .map_err(|_| ClientError::Closed)?;
        reply_rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Check if the client currently holds a live connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch connection state changes.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Topics with at least one registered handler.
    #[must_use]
    pub fn active_topics(&self) -> Vec<Topic> {
        self.registry.topics()
    }
}
