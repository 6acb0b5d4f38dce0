//! Retry executor for transient upstream failures.

use std::future::Future;
use std::time::Duration;

/// Failure classification hook for the retry executor.
///
/// Classification is a structured field comparison on the failure itself;
/// the executor never inspects message text.
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

/// Exponential backoff policy: the delay doubles each retry, no jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (so at most `max_retries + 1`
    /// attempts in total).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Run `operation`, retrying transient failures up to the budget.
    ///
    /// Non-transient failures propagate immediately and consume no budget.
    /// On exhaustion the last failure propagates unchanged.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        E: TransientError + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && retries < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(retries);
                    retries += 1;
                    tracing::debug!(
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
