//! Exponential backoff for seat-map fetches.
//!
//! Only errors reporting `is_retryable()` are retried. Every attempt and every
//! backoff sleep races the screen's cancellation token, so leaving the screen
//! stops a fetch immediately.

use crate::{SeatingError, SeatingResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of attempts, including the first one.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(200),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(64) as i32;
        let max_millis = self.max_delay.as_millis() as f64;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.max(1.0).powi(exponent);
        if millis.is_finite() && millis < max_millis {
            Duration::from_millis(millis.round() as u64)
        } else {
            self.max_delay
        }
    }
}

/// Run `fetch` until it succeeds, fails with a non-retryable error, runs out
/// of attempts, or `cancel` fires.
pub async fn retry_fetch<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    mut fetch: F,
) -> SeatingResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SeatingResult<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SeatingError::Cancelled),
            result = fetch() => result,
        };

        match result {
            Err(err) if err.is_retryable() && attempt < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    operation, attempt, attempts, err, delay
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SeatingError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            other => return other,
        }
    }
}
