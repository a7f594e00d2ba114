//! Minimum-interval throttle for outbound API calls

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default minimum delay between two API calls
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1000);

/// Cooperative throttle enforcing a minimum delay between fetches
///
/// This is not a token bucket: callers are not queued, so two callers arriving
/// together both wait out the same remainder and then fire close together.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY)
    }
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_fetch: Mutex::new(None),
        }
    }

    /// Time left before the next call may go out
    pub fn remaining(&self) -> Duration {
        let last = *self.last_fetch.lock().unwrap_or_else(|e| e.into_inner());
        match last {
            Some(at) => self.min_delay.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Sleeps until at least `min_delay` has passed since the last fetch
    pub async fn throttle(&self) {
        let wait = self.remaining();
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Throttling request");
            tokio::time::sleep(wait).await;
        }
    }

    /// Marks a fetch as having just completed
    pub fn record_fetch(&self) {
        *self.last_fetch.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
    }

    /// Extra wait after the API reported a rate-limit violation
    pub async fn cool_down(&self) {
        let wait = self.min_delay * 2;
        debug!(wait_ms = wait.as_millis() as u64, "Cooling down after rate limit");
        tokio::time::sleep(wait).await;
    }
}
