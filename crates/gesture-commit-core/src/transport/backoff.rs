use std::time::Duration;

/// Upper bound on the reconnect delay, in seconds.
pub const MAX_RECONNECT_DELAY_SECS: u64 = 30;

/// Delay before reconnect attempt `attempt` (0-indexed): `min(2^attempt, 30)` seconds.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let secs = 1u64
        .checked_shl(attempt)
        .unwrap_or(u64::MAX)
        .min(MAX_RECONNECT_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Consecutive-failure counter driving [`reconnect_delay`].
#[derive(Debug, Default)]
pub struct Backoff {
    attempt: u32,
}

impl Backoff {
    /// Delay for the current attempt, then advance the counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = reconnect_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of consecutive failures recorded so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
