use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::RemoteError;

/// Backoff settings for calls to Central.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::with_max_attempts(1)
    }
}

/// Which failures a call may be re-sent after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Repeating the call has the same effect as sending it once.
    Idempotent,
    /// The call creates something; only re-send it if it never reached
    /// Central.
    NonIdempotent,
}

impl RetryPolicy {
    pub fn allows(self, err: &RemoteError) -> bool {
        match self {
            Self::Idempotent => err.is_retryable(),
            Self::NonIdempotent => err.is_unsent(),
        }
    }
}

/// Run an idempotent `operation` with exponential backoff and jitter.
///
/// Only errors for which [`RemoteError::is_retryable`] holds are retried;
/// everything else, and the last failure once attempts run out, is returned
/// unchanged.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    retry_with_policy(config, RetryPolicy::Idempotent, operation_name, operation).await
}

/// Like [`retry_with_backoff`], retrying only the failures `policy` allows.
pub async fn retry_with_policy<F, Fut, T>(
    config: &RetryConfig,
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !policy.allows(&e) => return Err(e),
            Err(e) if attempt >= max_attempts => {
                tracing::error!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    "call to Central failed after max retries"
                );
                return Err(e);
            }
            Err(e) => {
                // 0.5x to 1.5x of the delay
                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let jittered = Duration::from_secs_f64(delay.as_secs_f64() * jitter);

                tracing::warn!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    delay_ms = jittered.as_millis() as u64,
                    "call to Central failed, retrying"
                );

                tokio::time::sleep(jittered).await;

                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * config.backoff_multiplier)
                        .min(config.max_delay.as_secs_f64()),
                );
            }
        }
    }
}
