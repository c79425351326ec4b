//! Retry policy with exponential backoff for oracle calls.
//!
//! The policy is a plain value and sleeping goes through the [`Sleeper`]
//! trait, so tests can substitute a fake clock and inspect the delays.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::OracleResult;

/// Something that can wait for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Fake clock that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}

/// Retry behaviour for a fallible call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles on each subsequent failure.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay to wait after the `failures`-th consecutive failure (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.pow(exponent))
            .min(self.max_delay)
    }
}

/// Run `operation` under `policy`, retrying retryable oracle errors.
pub async fn retry_async<F, Fut, T>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    operation_name: &str,
    operation: F,
) -> OracleResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = OracleResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut failures = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && failures + 1 < max_attempts => {
                failures += 1;
                let delay = policy.delay_after(failures);
                debug!(
                    operation = operation_name,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "Oracle call failed, retrying: {}",
                    e
                );
                sleeper.sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    operation = operation_name,
                    attempts = failures + 1,
                    "Oracle call gave up: {}",
                    e
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use crate::error::OracleError;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default().with_base_delay(Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));

        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(10), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_retry_eventual_success_records_backoff() {
        let policy = RetryPolicy::default().with_max_attempts(4);
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result = retry_async(&policy, &sleeper, "rank", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(OracleError::request_failed("503"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_retry_stops_at_max_attempts() {
        let policy = RetryPolicy::default().with_max_attempts(3);
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result: OracleResult<()> = retry_async(&policy, &sleeper, "rank", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(OracleError::Timeout(60)) }
        })
        .await;

        assert!(matches!(result, Err(OracleError::Timeout(60))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result: OracleResult<()> = retry_async(&policy, &sleeper, "describe", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(OracleError::invalid_response("no array")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }
}
