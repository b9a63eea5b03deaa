//! Topics and destination derivation.
//!
//! A topic is the caller-facing name of a logical channel; the destination
//! is the broker path a wire subscription is opened on. The mapping between
//! them is a pure function of the topic and must stay stable for the
//! lifetime of the process, so a replayed subscription lands on the same
//! destination as the original.

/// A topic identifier.
pub type Topic = String;

/// Maximum topic name length.
pub const MAX_TOPIC_LENGTH: usize = 256;

/// Validate a topic name.
///
/// # Errors
///
/// Returns an error message if the topic name is invalid.
pub fn validate_topic(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Topic name cannot be empty");
    }
    if name.len() > MAX_TOPIC_LENGTH {
        return Err("Topic name too long");
    }
    if name.starts_with('/') {
        return Err("Topic names are not destination paths");
    }
    if !name.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err("Topic name contains invalid characters");
    }
    Ok(())
}

/// Derives the broker destination path for a topic.
///
/// Implementations must be pure: the same topic always maps to the same
/// destination.
pub trait DestinationScheme: Send + Sync {
    /// Map a topic to its destination path.
    fn destination(&self, topic: &str) -> String;
}

/// Prefix scheme: `{topic}` → `{prefix}{topic}`.
pub struct TopicPrefixScheme {
    prefix: String,
}

impl TopicPrefixScheme {
    /// Create a scheme with a custom prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TopicPrefixScheme {
    fn default() -> Self {
        Self::new("/topic/")
    }
}

impl DestinationScheme for TopicPrefixScheme {
    fn destination(&self, topic: &str) -> String {
        format!("{}{}", self.prefix, topic)
    }
}

/// Route scheme for the consultation domain.
///
/// - `status_{no}` → `/topic/consultation/status/{no}`
/// - `consultation_{no}` → `/topic/consultation/{no}`
/// - `doctor_{id}_consultations` → `/topic/doctor/{id}/consultations`
/// - anything else → `/topic/{topic}`
#[derive(Debug, Default)]
pub struct ConsultationScheme;

impl DestinationScheme for ConsultationScheme {
    fn destination(&self, topic: &str) -> String {
        if let Some(no) = topic.strip_prefix("status_") {
            return format!("/topic/consultation/status/{no}");
        }
        if let Some(rest) = topic.strip_prefix("doctor_") {
            if let Some(id) = rest.strip_suffix("_consultations") {
                return format!("/topic/doctor/{id}/consultations");
            }
        }
        if let Some(no) = topic.strip_prefix("consultation_") {
            return format!("/topic/consultation/{no}");
        }
        format!("/topic/{topic}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_validation() {
        assert!(validate_topic("status_C1001").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("/topic/raw").is_err());
        assert!(validate_topic("bad\u{7f}topic").is_err());

        let long_name = "a".repeat(MAX_TOPIC_LENGTH + 1);
        assert!(validate_topic(&long_name).is_err());
    }

    #[test]
    fn test_prefix_scheme() {
        let scheme = TopicPrefixScheme::default();
        assert_eq!(scheme.destination("updates"), "/topic/updates");

        let custom = TopicPrefixScheme::new("/queue/");
        assert_eq!(custom.destination("jobs"), "/queue/jobs");
    }

    #[test]
    fn test_consultation_scheme_routes() {
        let scheme = ConsultationScheme;
        assert_eq!(
            scheme.destination("status_C1001"),
            "/topic/consultation/status/C1001"
        );
        assert_eq!(
            scheme.destination("consultation_C1001"),
            "/topic/consultation/C1001"
        );
        assert_eq!(
            scheme.destination("doctor_42_consultations"),
            "/topic/doctor/42/consultations"
        );
        assert_eq!(scheme.destination("announcements"), "/topic/announcements");
    }

    #[test]
    fn test_scheme_is_stable() {
        let scheme = ConsultationScheme;
        let first = scheme.destination("status_C1001");
        let second = scheme.destination("status_C1001");
        assert_eq!(first, second);
    }
}
