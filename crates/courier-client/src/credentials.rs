//! Credential seam to the external session store.
//!
//! The connection handshake carries a bearer credential when one is
//! available; without one the connect is attempted unauthenticated and the
//! broker may reject it. The session store is told when the broker rejects
//! the credential outright.

use async_trait::async_trait;

/// Supplies the bearer credential for the connection handshake.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Current bearer token, or `None` to connect unauthenticated.
    async fn token(&self) -> Option<String>;

    /// Called when the broker rejects the handshake as unauthorized.
    fn rejected(&self) {}
}

/// No credentials: always connects unauthenticated.
#[derive(Debug, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialSource for NoCredentials {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed bearer token.
#[derive(Debug)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Create a source that always returns the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_credentials() {
        assert_eq!(NoCredentials.token().await, None);
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let source = StaticCredentials::new("bearer-abc");
        assert_eq!(source.token().await, Some("bearer-abc".to_string()));
    }
}
