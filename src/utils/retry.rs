//! Retry with exponential backoff for transient store failures.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff policy for retrying a failed operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

/// Determines if an error is worth retrying.
pub trait Retryable {
    /// Returns true if the failed operation should be attempted again.
    fn is_retryable(&self) -> bool;
}

impl Retryable for anyhow::Error {
    fn is_retryable(&self) -> bool {
        let msg = self.to_string().to_lowercase();
        msg.contains("timeout")
            || msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("temporarily unavailable")
            || msg.contains("service unavailable")
            || msg.contains("too many requests")
    }
}

/// Run an async operation under the given policy, returning the last error
/// once attempts are exhausted or a non-retryable error is seen.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= policy.max_attempts || !error.is_retryable() {
                    return Err(error);
                }

                // Jitter keeps concurrent batch retries from synchronizing
                let jitter = Duration::from_millis(jitter_ms(delay.as_millis() as u64 / 4));
                sleep(delay + jitter).await;

                delay = Duration::from_secs_f64(delay.as_secs_f64() * policy.multiplier)
                    .min(policy.max_delay);
            }
        }
    }
}

fn jitter_ms(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    // Clock-seeded jitter; does not need to be uniform, only unsynchronized
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    seed % max
}
