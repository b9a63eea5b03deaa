//! Connection lifecycle management.
//!
//! One actor task owns the physical connection, the connection state
//! machine, the retry policy, and all registry/table mutation. Every caller
//! API call funnels into its mailbox, so state transitions are serialized
//! and subscription replay is atomic with respect to concurrent subscribe
//! and unsubscribe calls: commands queued during replay observe the
//! post-replay state.
//!
//! The transport object itself is owned by a separate driver task that
//! bridges it to the actor as events; nothing else may write to or close
//! the connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use courier_protocol::{codes, Frame, PROTOCOL_VERSION};
use courier_transport::{Connection, Connector};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backoff::LinearBackoff;
use crate::config::ClientConfig;
use crate::credentials::CredentialSource;
use crate::dispatch;
use crate::error::ClientError;
use crate::handler::HandlerRef;
use crate::metrics;
use crate::registry::{RemoveOutcome, TopicRegistry};
use crate::subscription::SubscriptionTable;
use crate::topic::{validate_topic, DestinationScheme};

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none wanted.
    Disconnected,
    /// An explicit connect attempt is in flight.
    Connecting,
    /// Session established; wire subscriptions are live.
    Connected,
    /// Connection lost; retries are scheduled.
    Reconnecting,
    /// Retry bound exhausted; waiting for an explicit connect.
    FailedPermanently,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::FailedPermanently => "failed",
        };
        write!(f, "{name}")
    }
}

type ConnectWaiter = oneshot::Sender<Result<(), ClientError>>;

/// Caller API calls, funneled through the actor mailbox.
pub(crate) enum Command {
    Connect {
        reply: ConnectWaiter,
    },
    Disconnect,
    Subscribe {
        topic: String,
        handler: HandlerRef,
    },
    Unsubscribe {
        topic: String,
        handler: HandlerRef,
    },
    Publish {
        destination: String,
        body: Vec<u8>,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
}

/// Internal events from dial tasks, the driver, and retry timers.
enum Event {
    DialDone {
        generation: u64,
        outcome: Result<Established, ClientError>,
    },
    Inbound {
        generation: u64,
        frame: Frame,
    },
    LinkClosed {
        generation: u64,
        reason: String,
    },
    Retry {
        generation: u64,
    },
}

/// A dialed connection with a completed session handshake.
struct Established {
    conn: Box<dyn Connection>,
    session_id: String,
    heartbeat: Duration,
}

/// The live session: the outbound queue into the driver task.
struct Session {
    generation: u64,
    outbound: mpsc::UnboundedSender<Frame>,
    driver: JoinHandle<()>,
}

/// The connection lifecycle actor.
pub(crate) struct ConnectionActor {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    scheme: Arc<dyn DestinationScheme>,
    credentials: Arc<dyn CredentialSource>,
    registry: Arc<TopicRegistry>,
    table: Arc<SubscriptionTable>,
    state: watch::Sender<ConnectionState>,
    backoff: LinearBackoff,
    /// Bumped whenever scheduled retries and in-flight dials become stale
    /// (explicit connect or disconnect); events carry the generation they
    /// were started under and stale ones are ignored.
    generation: u64,
    dialing: bool,
    waiters: Vec<ConnectWaiter>,
    session: Option<Session>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl ConnectionActor {
    pub(crate) fn new(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        scheme: Arc<dyn DestinationScheme>,
        credentials: Arc<dyn CredentialSource>,
        registry: Arc<TopicRegistry>,
        table: Arc<SubscriptionTable>,
        state: watch::Sender<ConnectionState>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let backoff = LinearBackoff::new(config.base_delay(), config.reconnect.max_attempts);
        let (events, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connector,
            scheme,
            credentials,
            registry,
            table,
            state,
            backoff,
            generation: 0,
            dialing: false,
            waiters: Vec::new(),
            session: None,
            commands,
            events,
            events_rx,
        }
    }

    /// Run until every client handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                Some(event) = self.events_rx.recv() => self.handle_event(event),

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }
        self.teardown();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { reply } => self.connect(reply),
            Command::Disconnect => self.disconnect(),
            Command::Subscribe { topic, handler } => self.subscribe(topic, handler),
            Command::Unsubscribe { topic, handler } => self.unsubscribe(&topic, &handler),
            Command::Publish {
                destination,
                body,
                reply,
            } => {
                let _ = reply.send(self.publish(destination, body));
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::DialDone {
                generation,
                outcome,
            } => self.on_dial_done(generation, outcome),
            Event::Inbound { generation, frame } => self.on_inbound(generation, frame),
            Event::LinkClosed { generation, reason } => self.on_link_closed(generation, &reason),
            Event::Retry { generation } => self.on_retry(generation),
        }
    }

    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = %prev, to = %next, "Connection state changed");
        }
    }

    // ---- caller commands ----------------------------------------------

    fn connect(&mut self, reply: ConnectWaiter) {
        if self.current_state() == ConnectionState::Connected {
            let _ = reply.send(Ok(()));
            return;
        }

        self.waiters.push(reply);

        if self.dialing {
            debug!("Connect coalesced into the in-flight attempt");
            return;
        }

        // An explicit connect cancels any scheduled retry and dials now;
        // leaving the terminal state also resets the attempt counter.
        self.generation += 1;
        if self.current_state() == ConnectionState::FailedPermanently {
            self.backoff.reset();
        }
        self.set_state(ConnectionState::Connecting);
        self.start_dial();
    }

    fn disconnect(&mut self) {
        if self.current_state() == ConnectionState::Disconnected {
            return;
        }

        // Cancels scheduled retries and makes any in-flight dial stale.
        self.generation += 1;

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(ClientError::Closed));
        }

        if let Some(session) = self.session.take() {
            // Best-effort goodbye; dropping the sender lets the driver
            // flush it and close the transport cleanly.
            let _ = session.outbound.send(Frame::Disconnect);
        }

        self.clear_wire_state();
        self.set_state(ConnectionState::Disconnected);
        info!("Disconnected");
    }

    fn subscribe(&mut self, topic: String, handler: HandlerRef) {
        if let Err(reason) = validate_topic(&topic) {
            warn!(topic = %topic, reason, "Rejecting invalid topic");
            return;
        }

        if !self.registry.add(&topic, handler) {
            debug!(topic = %topic, "Handler already registered");
            return;
        }

        if self.current_state() == ConnectionState::Connected {
            self.open_wire_subscription(&topic);
        } else {
            debug!(topic = %topic, "Not connected; subscription deferred until replay");
        }
    }

    fn unsubscribe(&mut self, topic: &str, handler: &HandlerRef) {
        match self.registry.remove(topic, handler) {
            RemoveOutcome::NotRegistered => {
                debug!(topic = %topic, "Unsubscribe for unregistered handler");
            }
            RemoveOutcome::Removed => {
                debug!(
                    topic = %topic,
                    remaining = self.registry.handler_count(topic),
                    "Handler removed; wire subscription kept"
                );
            }
            RemoveOutcome::RemovedLast => {
                if let Some(sub) = self.table.close(topic) {
                    if let Some(session) = &self.session {
                        let _ = session.outbound.send(Frame::unsubscribe(sub.id));
                    }
                    metrics::set_active_subscriptions(self.table.len());
                }
                debug!(topic = %topic, "Last handler removed; topic closed");
            }
        }
    }

    fn publish(&mut self, destination: String, body: Vec<u8>) -> Result<(), ClientError> {
        match self.current_state() {
            ConnectionState::Connected => {}
            ConnectionState::FailedPermanently => return Err(ClientError::RetriesExhausted),
            _ => return Err(ClientError::NotConnected),
        }
        let Some(session) = &self.session else {
            return Err(ClientError::NotConnected);
        };

        metrics::record_message(body.len(), "outbound");
        session
            .outbound
            .send(Frame::send(destination, body))
            .map_err(|_| ClientError::NotConnected)
    }

    // ---- dialing and handshake ----------------------------------------

    fn start_dial(&mut self) {
        self.dialing = true;

        let generation = self.generation;
        let connector = Arc::clone(&self.connector);
        let credentials = Arc::clone(&self.credentials);
        let endpoint = self.config.endpoint.clone();
        let heartbeat_ms = self.config.heartbeat.interval_ms as u32;
        let handshake_timeout = self.config.handshake_timeout();
        let events = self.events.clone();

        debug!(endpoint = %endpoint, attempt = self.backoff.attempts() + 1, "Dialing broker");

        tokio::spawn(async move {
            let outcome = dial_and_handshake(
                connector.as_ref(),
                &endpoint,
                credentials.as_ref(),
                heartbeat_ms,
                handshake_timeout,
            )
            .await;
            let _ = events.send(Event::DialDone {
                generation,
                outcome,
            });
        });
    }

    fn on_dial_done(&mut self, generation: u64, outcome: Result<Established, ClientError>) {
        self.dialing = false;

        if generation != self.generation {
            // A disconnect or a newer connect superseded this attempt.
            if let Ok(established) = outcome {
                debug!("Discarding connection from superseded dial");
                let mut conn = established.conn;
                tokio::spawn(async move {
                    let _ = conn.close().await;
                });
            }
            // Callers that queued up after the supersession still want a
            // connection.
            if !self.waiters.is_empty() && self.session.is_none() {
                self.set_state(ConnectionState::Connecting);
                self.start_dial();
            }
            return;
        }

        match outcome {
            Ok(established) => self.on_connected(established),
            Err(error) => self.on_connect_failed(error),
        }
    }

    fn on_connected(&mut self, established: Established) {
        let generation = self.generation;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(run_driver(
            established.conn,
            outbound_rx,
            self.events.clone(),
            generation,
            established.heartbeat,
        ));

        self.session = Some(Session {
            generation,
            outbound: outbound_tx,
            driver,
        });

        self.backoff.reset();
        self.set_state(ConnectionState::Connected);
        info!(
            session = %established.session_id,
            heartbeat_ms = established.heartbeat.as_millis() as u64,
            "Connected to broker"
        );
        metrics::record_connect();

        // Replay before resolving any waiter, so a caller that subscribes
        // right after connect() resolves never races an empty wire state.
        self.replay_subscriptions();

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }
    }

    fn on_connect_failed(&mut self, error: ClientError) {
        warn!(error = %error, "Connection attempt failed");
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(error.clone()));
        }
        self.schedule_retry();
    }

    // ---- reconnect policy ---------------------------------------------

    fn schedule_retry(&mut self) {
        match self.backoff.next_delay() {
            Some(delay) => {
                self.set_state(ConnectionState::Reconnecting);
                metrics::record_reconnect_attempt();

                let generation = self.generation;
                let events = self.events.clone();
                debug!(
                    attempt = self.backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect attempt"
                );
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(Event::Retry { generation });
                });
            }
            None => {
                error!(
                    attempts = self.backoff.attempts(),
                    "Reconnect attempts exhausted; waiting for an explicit connect"
                );
                self.set_state(ConnectionState::FailedPermanently);
            }
        }
    }

    fn on_retry(&mut self, generation: u64) {
        if generation != self.generation
            || self.dialing
            || self.session.is_some()
            || self.current_state() != ConnectionState::Reconnecting
        {
            return;
        }
        self.start_dial();
    }

    fn on_link_closed(&mut self, generation: u64, reason: &str) {
        let Some(session) = &self.session else {
            return;
        };
        if session.generation != generation {
            return;
        }

        warn!(reason = %reason, "Connection lost");
        self.drop_session();
        self.schedule_retry();
    }

    // ---- inbound dispatch ---------------------------------------------

    fn on_inbound(&mut self, generation: u64, frame: Frame) {
        let Some(session) = &self.session else {
            return;
        };
        if session.generation != generation {
            return;
        }

        match frame {
            Frame::Message {
                subscription,
                destination,
                body,
            } => {
                metrics::record_message(body.len(), "inbound");
                match self.table.topic_for(&subscription) {
                    Some(topic) => {
                        let handlers = self.registry.handlers(&topic);
                        if handlers.is_empty() {
                            debug!(topic = %topic, "No handlers registered; dropping message");
                            return;
                        }
                        dispatch::dispatch(&topic, &body, &handlers);
                    }
                    None => {
                        // Possible after unsubscribe raced an in-flight delivery.
                        debug!(
                            subscription = %subscription,
                            destination = %destination,
                            "Message for unknown subscription"
                        );
                    }
                }
            }
            Frame::Error { code, message } => {
                warn!(code, message = %message, "Broker error; treating as connection failure");
                self.drop_session();
                self.schedule_retry();
            }
            Frame::Connected { .. } => {
                debug!("Duplicate CONNECTED frame ignored");
            }
            other => {
                debug!(frame_type = ?other.frame_type(), "Unexpected frame from broker");
            }
        }
    }

    // ---- wire subscriptions -------------------------------------------

    fn replay_subscriptions(&mut self) {
        self.table.clear();
        let topics = self.registry.topics();
        let count = topics.len();
        for topic in topics {
            self.open_wire_subscription(&topic);
        }
        if count > 0 {
            info!(count, "Replayed subscriptions");
        }
    }

    fn open_wire_subscription(&mut self, topic: &str) {
        let Some(session) = &self.session else {
            return;
        };
        let destination = self.scheme.destination(topic);
        let Some(id) = self.table.open(topic, &destination) else {
            // Already wired; handlers share the existing subscription.
            return;
        };
        debug!(
            topic = %topic,
            destination = %destination,
            subscription = %id,
            "Opening wire subscription"
        );
        let _ = session.outbound.send(Frame::subscribe(id, destination));
        metrics::set_active_subscriptions(self.table.len());
    }

    fn clear_wire_state(&mut self) {
        let cleared = self.table.clear();
        if cleared > 0 {
            debug!(count = cleared, "Cleared wire subscriptions");
        }
        metrics::set_active_subscriptions(0);
    }

    fn drop_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.driver.abort();
        }
        self.clear_wire_state();
    }

    fn teardown(&mut self) {
        debug!("All client handles dropped; shutting down connection actor");
        self.generation += 1;
        if let Some(session) = self.session.take() {
            let _ = session.outbound.send(Frame::Disconnect);
        }
        self.clear_wire_state();
        self.set_state(ConnectionState::Disconnected);
    }
}

// ---- dial task --------------------------------------------------------

async fn dial_and_handshake(
    connector: &dyn Connector,
    endpoint: &str,
    credentials: &dyn CredentialSource,
    heartbeat_ms: u32,
    handshake_timeout: Duration,
) -> Result<Established, ClientError> {
    let mut conn = connector.connect(endpoint).await?;

    let token = credentials.token().await;
    if token.is_none() {
        debug!("No credential available; connecting unauthenticated");
    }
    conn.send(Frame::connect(PROTOCOL_VERSION, token, heartbeat_ms))
        .await?;

    match tokio::time::timeout(handshake_timeout, await_connected(conn.as_mut())).await {
        Ok(Ok((session_id, version, heartbeat_ms))) => {
            if !courier_protocol::is_supported(version) {
                let _ = conn.close().await;
                return Err(ClientError::UnsupportedVersion(version));
            }
            Ok(Established {
                conn,
                session_id,
                heartbeat: Duration::from_millis(u64::from(heartbeat_ms)),
            })
        }
        Ok(Err(error)) => {
            let _ = conn.close().await;
            if let ClientError::Rejected { code, .. } = &error {
                if *code == codes::UNAUTHORIZED {
                    credentials.rejected();
                }
            }
            Err(error)
        }
        Err(_) => {
            let _ = conn.close().await;
            Err(ClientError::HandshakeTimeout)
        }
    }
}

async fn await_connected(conn: &mut dyn Connection) -> Result<(String, u8, u32), ClientError> {
    loop {
        match conn.recv().await {
            Ok(Some(Frame::Connected {
                session,
                version,
                heartbeat,
            })) => return Ok((session, version, heartbeat)),
            Ok(Some(Frame::Error { code, message })) => {
                return Err(ClientError::Rejected { code, message });
            }
            Ok(Some(Frame::Ping)) => {
                conn.send(Frame::Pong).await?;
            }
            Ok(Some(frame)) => {
                debug!(frame_type = ?frame.frame_type(), "Ignoring frame before CONNECTED");
            }
            Ok(None) => {
                return Err(ClientError::Transport(
                    "connection closed during handshake".into(),
                ));
            }
            Err(error) => return Err(error.into()),
        }
    }
}

// ---- driver task ------------------------------------------------------

/// Drives one established connection: forwards outbound frames, surfaces
/// inbound frames as events, and keeps the negotiated heartbeat. Exits when
/// the link fails or the actor drops the outbound sender.
async fn run_driver(
    mut conn: Box<dyn Connection>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    events: mpsc::UnboundedSender<Event>,
    generation: u64,
    heartbeat: Duration,
) {
    let heartbeats_enabled = !heartbeat.is_zero();
    let tick_period = if heartbeats_enabled {
        heartbeat
    } else {
        Duration::from_secs(3600)
    };
    let mut ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_inbound = tokio::time::Instant::now();

    let report = |reason: String| {
        let _ = events.send(Event::LinkClosed { generation, reason });
    };

    loop {
        tokio::select! {
            biased;

            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = conn.send(frame).await {
                        report(e.to_string());
                        break;
                    }
                }
                None => {
                    // Actor dropped the session: clean close.
                    let _ = conn.close().await;
                    break;
                }
            },

            received = conn.recv() => match received {
                Ok(Some(Frame::Ping)) => {
                    last_inbound = tokio::time::Instant::now();
                    if conn.send(Frame::Pong).await.is_err() {
                        report("failed to answer heartbeat".into());
                        break;
                    }
                }
                Ok(Some(Frame::Pong)) => {
                    last_inbound = tokio::time::Instant::now();
                }
                Ok(Some(frame)) => {
                    last_inbound = tokio::time::Instant::now();
                    if events.send(Event::Inbound { generation, frame }).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    report("closed by broker".into());
                    break;
                }
                Err(e) => {
                    report(e.to_string());
                    break;
                }
            },

            _ = ticker.tick(), if heartbeats_enabled => {
                if last_inbound.elapsed() > tick_period * 2 {
                    let _ = conn.close().await;
                    report("heartbeat timed out".into());
                    break;
                }
                if conn.send(Frame::Ping).await.is_err() {
                    report("failed to send heartbeat".into());
                    break;
                }
            }
        }
    }
}
