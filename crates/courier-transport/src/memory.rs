//! In-process transport for tests.
//!
//! A [`MemoryConnector`] dials a [`MemoryListener`] living in the same
//! process; frames cross a pair of unbounded channels without touching the
//! codec. Tests script the broker side through [`MemoryPeer`] and can refuse
//! dials to exercise the reconnect policy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use courier_protocol::Frame;
use tokio::sync::mpsc;

use crate::traits::{Connection, Connector, TransportError};

/// Create a connected connector/listener pair.
#[must_use]
pub fn pair() -> (MemoryConnector, MemoryListener) {
    let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
    (
        MemoryConnector {
            incoming: incoming_tx,
            refuse: Arc::new(AtomicBool::new(false)),
            dials: Arc::new(AtomicUsize::new(0)),
        },
        MemoryListener {
            incoming: incoming_rx,
        },
    )
}

/// Dial side of the in-process transport.
#[derive(Clone)]
pub struct MemoryConnector {
    incoming: mpsc::UnboundedSender<MemoryPeer>,
    refuse: Arc<AtomicBool>,
    dials: Arc<AtomicUsize>,
}

impl MemoryConnector {
    /// Make subsequent dials fail (or succeed again).
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of dial attempts made so far, refused ones included.
    #[must_use]
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _endpoint: &str) -> Result<Box<dyn Connection>, TransportError> {
        self.dials.fetch_add(1, Ordering::SeqCst);

        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Dial("connection refused".into()));
        }

        let (to_peer_tx, to_peer_rx) = mpsc::unbounded_channel();
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            tx: to_client_tx,
            rx: to_peer_rx,
        };

        self.incoming
            .send(peer)
            .map_err(|_| TransportError::Dial("listener dropped".into()))?;

        Ok(Box::new(MemoryConnection {
            tx: Some(to_peer_tx),
            rx: to_client_rx,
            open: true,
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Accept side of the in-process transport.
pub struct MemoryListener {
    incoming: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryListener {
    /// Wait for the next dialed connection.
    ///
    /// Returns `None` when every connector clone has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.incoming.recv().await
    }
}

/// Broker end of one in-process connection.
///
/// Dropping the peer closes the connection as seen by the client.
pub struct MemoryPeer {
    tx: mpsc::UnboundedSender<Frame>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl MemoryPeer {
    /// Deliver a frame to the client.
    ///
    /// Returns `false` if the client end is gone.
    pub fn send(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }

    /// Receive the next frame from the client.
    ///
    /// Returns `None` once the client end is closed.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

struct MemoryConnection {
    tx: Option<mpsc::UnboundedSender<Frame>>,
    rx: mpsc::UnboundedReceiver<Frame>,
    open: bool,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.rx.recv().await {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.open = false;
                Ok(None)
            }
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::ConnectionClosed)?;
        tx.send(frame).map_err(|_| TransportError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dial_and_exchange_frames() {
        let (connector, mut listener) = pair();

        let mut conn = connector.connect("memory://test").await.unwrap();
        let mut peer = listener.accept().await.unwrap();

        conn.send(Frame::Ping).await.unwrap();
        assert_eq!(peer.recv().await, Some(Frame::Ping));

        assert!(peer.send(Frame::Pong));
        assert_eq!(conn.recv().await.unwrap(), Some(Frame::Pong));
    }

    #[tokio::test]
    async fn test_peer_drop_closes_connection() {
        let (connector, mut listener) = pair();

        let mut conn = connector.connect("memory://test").await.unwrap();
        let peer = listener.accept().await.unwrap();
        drop(peer);

        assert_eq!(conn.recv().await.unwrap(), None);
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_refused_dial() {
        let (connector, _listener) = pair();
        connector.set_refuse(true);

        assert!(connector.connect("memory://test").await.is_err());
        assert_eq!(connector.dial_count(), 1);

        connector.set_refuse(false);
        assert!(connector.connect("memory://test").await.is_ok());
        assert_eq!(connector.dial_count(), 2);
    }
}
