//! Client metrics.
//!
//! Instrumentation uses the `metrics` facade only; installing a recorder or
//! exporter is the host application's decision.

use metrics::{counter, gauge};

/// Metric names.
pub mod names {
    pub const CONNECTS_TOTAL: &str = "courier_connects_total";
    pub const RECONNECT_ATTEMPTS_TOTAL: &str = "courier_reconnect_attempts_total";
    pub const MESSAGES_TOTAL: &str = "courier_messages_total";
    pub const MESSAGES_BYTES: &str = "courier_messages_bytes";
    pub const DISPATCH_ERRORS_TOTAL: &str = "courier_dispatch_errors_total";
    pub const SUBSCRIPTIONS_ACTIVE: &str = "courier_subscriptions_active";
}

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    metrics::describe_counter!(
        names::CONNECTS_TOTAL,
        "Successful broker connections since startup"
    );
    metrics::describe_counter!(
        names::RECONNECT_ATTEMPTS_TOTAL,
        "Reconnect attempts scheduled after a connection failure"
    );
    metrics::describe_counter!(names::MESSAGES_TOTAL, "Messages processed");
    metrics::describe_counter!(names::MESSAGES_BYTES, "Message bytes processed");
    metrics::describe_counter!(
        names::DISPATCH_ERRORS_TOTAL,
        "Messages dropped or handlers faulted during dispatch"
    );
    metrics::describe_gauge!(
        names::SUBSCRIPTIONS_ACTIVE,
        "Wire subscriptions on the current connection"
    );
}

/// Record a successful connection.
pub fn record_connect() {
    counter!(names::CONNECTS_TOTAL).increment(1);
}

/// Record a scheduled reconnect attempt.
pub fn record_reconnect_attempt() {
    counter!(names::RECONNECT_ATTEMPTS_TOTAL).increment(1);
}

/// Record a message.
pub fn record_message(bytes: usize, direction: &str) {
    counter!(names::MESSAGES_TOTAL, "direction" => direction.to_string()).increment(1);
    counter!(names::MESSAGES_BYTES, "direction" => direction.to_string()).increment(bytes as u64);
}

/// Record a dispatch fault (decode failure or handler panic).
pub fn record_dispatch_error(kind: &str) {
    counter!(names::DISPATCH_ERRORS_TOTAL, "kind" => kind.to_string()).increment(1);
}

/// Update the live wire subscription count.
pub fn set_active_subscriptions(count: usize) {
    gauge!(names::SUBSCRIPTIONS_ACTIVE).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_does_not_panic() {
        init_metrics();
        record_connect();
        record_reconnect_attempt();
        record_message(128, "inbound");
        record_dispatch_error("decode");
        set_active_subscriptions(3);
    }
}
