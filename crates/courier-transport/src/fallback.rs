//! Fallback connector chain.
//!
//! Tries a list of connectors in priority order until one of them dials
//! successfully, so a client can downgrade (e.g. WebSocket behind a proxy
//! that mangles it) without the caller knowing.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::traits::{Connection, Connector, TransportError};

/// A connector that tries multiple connectors in order of preference.
pub struct FallbackConnector {
    connectors: Vec<Arc<dyn Connector>>,
}

impl FallbackConnector {
    /// Create a new fallback connector with the given chain.
    ///
    /// Connectors are tried in order (first = highest priority).
    #[must_use]
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self { connectors }
    }

    /// Append a connector to the chain.
    pub fn push(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.push(connector);
    }

    /// Get the connector names in priority order.
    #[must_use]
    pub fn connector_names(&self) -> Vec<&'static str> {
        self.connectors.iter().map(|c| c.name()).collect()
    }
}

#[async_trait]
impl Connector for FallbackConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError> {
        let mut last_error = TransportError::Other("no connectors configured".into());

        for connector in &self.connectors {
            if !connector.is_available() {
                continue;
            }

            match connector.connect(endpoint).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    debug!(transport = connector.name(), error = %e, "Connector failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }

    fn is_available(&self) -> bool {
        self.connectors.iter().any(|c| c.is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory;

    #[tokio::test]
    async fn test_falls_back_to_next_connector() {
        let (refusing, _refusing_listener) = memory::pair();
        refusing.set_refuse(true);
        let (accepting, mut listener) = memory::pair();

        let chain = FallbackConnector::new(vec![Arc::new(refusing), Arc::new(accepting)]);
        assert_eq!(chain.connector_names(), vec!["memory", "memory"]);

        let conn = chain.connect("memory://test").await.unwrap();
        assert!(conn.is_open());
        assert!(listener.accept().await.is_some());
    }

    #[tokio::test]
    async fn test_all_connectors_fail() {
        let (refusing, _listener) = memory::pair();
        refusing.set_refuse(true);

        let chain = FallbackConnector::new(vec![Arc::new(refusing)]);
        assert!(chain.connect("memory://test").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let chain = FallbackConnector::new(Vec::new());
        assert!(chain.connect("memory://test").await.is_err());
        assert!(!chain.is_available());
    }
}
