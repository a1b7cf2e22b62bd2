//! Bounded retry for transient feed failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::fse::FeedError;

pub const DEFAULT_ATTEMPTS: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed, the first one included.
    pub attempts: u32,
    /// Pause between invocations.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or runs out of attempts.
///
/// Only errors with [`FeedError::is_transient`] are retried; the last one is
/// returned once `policy.attempts` invocations have failed.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.attempts => {
                warn!(
                    attempt,
                    attempts = policy.attempts,
                    "transient feed failure, retrying in {:?}: {err}",
                    policy.interval
                );
                attempt += 1;
                tokio::time::sleep(policy.interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            interval: Duration::ZERO,
        }
    }

    fn throttled() -> FeedError {
        FeedError::TooManyRequests("Too many requests in 60 second period".to_string())
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = retry(&quick(5), || {
            calls.set(calls.get() + 1);
            let call = calls.get();
            async move {
                if call <= 3 {
                    Err(throttled())
                } else {
                    Ok("payload")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry(&quick(3), || {
            calls.set(calls.get() + 1);
            async { Err(throttled()) }
        })
        .await;

        assert!(matches!(result, Err(FeedError::TooManyRequests(_))));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn fatal_failures_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry(&quick(10), || {
            calls.set(calls.get() + 1);
            async { Err(FeedError::Maintenance("Currently Closed for Maintenance".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(FeedError::Maintenance(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_interval_between_attempts() {
        let policy = RetryPolicy {
            attempts: 3,
            interval: Duration::from_secs(60),
        };
        let start = tokio::time::Instant::now();
        let calls = Cell::new(0);
        let _ = retry(&policy, || {
            calls.set(calls.get() + 1);
            async { Err::<(), _>(FeedError::UnderMinimumDelay("under the minimum delay".into())) }
        })
        .await;

        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
    }
}
