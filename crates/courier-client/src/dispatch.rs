//! Inbound message dispatch.
//!
//! Each inbound frame is decoded once and delivered to every handler
//! registered for its topic. Faults are isolated twice over: an
//! undecodable body drops only that message, and a panicking handler
//! never stops the remaining handlers or the connection.

use crate::handler::HandlerRef;
use crate::metrics;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, warn};

/// Decode a message body and fan it out to the given handlers.
pub(crate) fn dispatch(topic: &str, body: &[u8], handlers: &[HandlerRef]) {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(topic = %topic, error = %e, "Dropping undecodable message");
            metrics::record_dispatch_error("decode");
            return;
        }
    };

    for handler in handlers {
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.on_message(&payload)));
        if outcome.is_err() {
            error!(topic = %topic, "Handler panicked; continuing with remaining handlers");
            metrics::record_dispatch_error("handler");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fan_out_to_all_handlers() {
        let count = Arc::new(AtomicUsize::new(0));
        let handlers: Vec<HandlerRef> = (0..3)
            .map(|_| {
                let count = Arc::clone(&count);
                handler_fn(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        dispatch("updates", br#"{"type":"x"}"#, &handlers);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_undecodable_body_is_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counting = {
            let count = Arc::clone(&count);
            handler_fn(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        dispatch("updates", b"not json", &[counting]);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let count = Arc::new(AtomicUsize::new(0));
        let panicking = handler_fn(|_| panic!("handler bug"));
        let counting = {
            let count = Arc::clone(&count);
            handler_fn(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        dispatch("updates", b"{}", &[panicking, counting]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_sees_decoded_payload() {
        let seen = Arc::new(AtomicUsize::new(0));
        let handler = {
            let seen = Arc::clone(&seen);
            handler_fn(move |payload| {
                if payload["type"] == "x" {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        dispatch("updates", br#"{"type":"x"}"#, &[handler]);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
