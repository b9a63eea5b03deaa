//! Protocol versioning.
//!
//! The CONNECT frame carries the version the client speaks; CONNECTED echoes
//! the version the broker settled on. A session only proceeds when the
//! broker's choice is one this client supports.

/// Protocol version this client speaks.
pub const PROTOCOL_VERSION: u8 = 1;

/// Oldest protocol version this client can still talk to.
pub const MIN_SUPPORTED_VERSION: u8 = 1;

/// Check whether a broker-negotiated version is acceptable.
#[must_use]
pub fn is_supported(version: u8) -> bool {
    (MIN_SUPPORTED_VERSION..=PROTOCOL_VERSION).contains(&version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_supported() {
        assert!(is_supported(PROTOCOL_VERSION));
        assert!(is_supported(MIN_SUPPORTED_VERSION));
    }

    #[test]
    fn test_future_version_rejected() {
        assert!(!is_supported(PROTOCOL_VERSION + 1));
    }

    #[test]
    fn test_zero_rejected() {
        assert!(!is_supported(0));
    }
}
