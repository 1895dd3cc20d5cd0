//! Retry logic with growing backoff
//!
//! Login against the backend is flaky under load, so session acquisition is
//! wrapped in [`with_retry`]. After failed attempt `n` the loop waits
//! `n * delay` before attempt `n + 1`. Only transient errors are retried;
//! rejected credentials, bad key material and malformed handshakes fail on
//! the first attempt.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Transport failures and server-side status codes are transient
            Error::Network(_) | Error::Status { .. } => true,
            // A bad key or a malformed handshake will not fix itself
            Error::Crypto(_) | Error::Protocol(_) => false,
            // Invalid credentials are permanent
            Error::Authentication { .. } => false,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Base delay, multiplied by the number of the attempt that just failed
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `failed_attempt` (1-based) failed.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.delay.saturating_mul(failed_attempt)
    }
}

/// Runs `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent. An exhausted budget surfaces as [`Error::LoginExhausted`].
/// `cancel` is checked before every attempt and interrupts the backoff sleep;
/// either way the result is [`Error::Cancelled`].
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(attempts = attempt, "Cancelled before next attempt");
            return Err(Error::Cancelled);
        }
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Attempt failed, retrying"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!(attempts = attempt, "Cancelled during retry backoff");
                        return Err(Error::Cancelled);
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "Operation failed after all retry attempts exhausted"
                );
                return Err(Error::LoginExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, attempt, "Operation failed with non-retryable error");
                return Err(e);
            }
        }
    }
}
