//! Minimum spacing between feed requests.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Cooldown the feed enforces between requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(6);

/// Blocks until `min_interval` has passed since the previous request ended.
///
/// One limiter is shared by every request a client issues; callers hold it
/// for the whole request so two requests never overlap.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_finished: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_finished: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn wait(&self) {
        if let Some(last) = self.last_finished {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                debug!("rate limited, sleeping {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    pub fn finished(&mut self) {
        self.last_finished = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
