//! Retry with exponential backoff and jitter, bounded by a deadline.

use opentelemetry::{otel_debug, otel_warn};
use rand::Rng;
use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};

use crate::retry_classification::RetryErrorType;

/// How failed export attempts are retried.
///
/// The delay before retry `n` (starting at 0) is
/// `min(initial_delay * 2^n + jitter, max_delay)` with a random jitter in
/// `0..=jitter`. A server-provided throttling delay replaces the computed one.
/// Retries never extend past the export's timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound of any delay.
    pub max_delay: Duration,
    /// Upper bound of the random amount added to each delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1600),
            jitter: Duration::from_millis(100),
        }
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// Generates a random jitter value up to max_jitter
fn generate_jitter(max_jitter: Duration) -> Duration {
    let max = as_millis_u64(max_jitter);
    Duration::from_millis(rand::rng().random_range(0..=max))
}

/// Run `operation` until it succeeds, fails permanently, runs out of retries
/// or runs out of time.
///
/// `operation` receives the time left before `deadline`. The deadline is
/// checked before every attempt, and a retry whose delay would end past the
/// deadline is not attempted. The last error is returned when giving up.
pub(crate) fn retry_with_backoff<F, C, T, E>(
    policy: &RetryPolicy,
    deadline: Instant,
    error_classifier: C,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(Duration) -> Result<T, E>,
    C: Fn(&E) -> RetryErrorType,
    E: Display,
{
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let err = match operation(remaining) {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        let wait = match error_classifier(&err) {
            RetryErrorType::NonRetryable => return Err(err),
            _ if attempt >= policy.max_retries => {
                otel_warn!(
                    name: "OtlpRetry.RetriesExhausted",
                    operation = operation_name,
                    attempts = attempt + 1,
                    error = err.to_string()
                );
                return Err(err);
            }
            RetryErrorType::Retryable => {
                std::cmp::min(delay + generate_jitter(policy.jitter), policy.max_delay)
            }
            RetryErrorType::Throttled(server_delay) => server_delay,
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if wait >= remaining {
            otel_warn!(
                name: "OtlpRetry.DeadlineExceeded",
                operation = operation_name,
                attempts = attempt + 1,
                error = err.to_string()
            );
            return Err(err);
        }

        attempt += 1;
        otel_debug!(
            name: "OtlpRetry.Retrying",
            operation = operation_name,
            attempt = attempt,
            delay_ms = as_millis_u64(wait)
        );
        thread::sleep(wait);
        delay = std::cmp::min(delay * 2, policy.max_delay);
    }
}
