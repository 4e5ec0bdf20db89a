//! Retry logic with exponential backoff for transient errors.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::types::RetryConfig;

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called when an operation is being retried.
    ///
    /// # Arguments
    /// * `attempt` - Current attempt number (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay_secs` - Seconds until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: f64);
}

/// Callback that reports retries through the `log` facade.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay_secs: f64) {
        log::warn!(
            "Attempt {}/{} failed: {}. Retrying in {:.1}s...",
            attempt,
            max_attempts,
            error,
            delay_secs
        );
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation if it returns a retryable error, using exponential
/// backoff between attempts. Non-retryable errors are returned immediately.
/// When `cancel` is tripped during a backoff pause the last error is
/// returned without further attempts.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    callback: Option<&dyn RetryCallback>,
    cancel: Option<&CancelToken>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let e = match operation() {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !e.is_retryable() || attempt + 1 >= max_attempts {
            return Err(e);
        }

        let delay = config.delay_for_attempt(attempt);
        if let Some(cb) = callback {
            cb.on_retry(attempt + 1, max_attempts, &e, delay.as_secs_f64());
        }

        let completed = match cancel {
            Some(token) => token.sleep(delay),
            None => {
                std::thread::sleep(delay);
                true
            }
        };
        if !completed {
            return Err(e);
        }

        attempt += 1;
    }
}
