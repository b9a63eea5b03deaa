//! Linear backoff for reconnect scheduling.
//!
//! Successive delays grow as `base_delay * attempt_number` up to a bounded
//! number of attempts. The cadence is linear, not exponential; keep it that
//! way unless the retry policy itself is being changed.

use std::time::Duration;

/// Bounded linear backoff state.
#[derive(Clone, Debug)]
pub struct LinearBackoff {
    /// Delay multiplied by the attempt number.
    base_delay: Duration,
    /// Attempts allowed before giving up.
    max_attempts: u32,
    /// Attempts consumed since the last reset.
    attempts: u32,
}

impl LinearBackoff {
    /// Create a new backoff.
    #[must_use]
    pub const fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Consume one attempt and return the delay before it, or `None` when
    /// the attempt bound is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.base_delay * self.attempts)
    }

    /// Reset after a successful connect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Check whether the attempt bound is exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
