//! Bounded retry around a single fallible request.
//!
//! Transient errors (see [`ScraperError::is_retriable`]) are retried with
//! delays from a fresh [`CollisionBackoff`], until either the attempt budget
//! or the wall-clock budget runs out. Anything else is returned immediately
//! and consumes no budget.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::backoff::{CollisionBackoff, DEFAULT_STEP};
use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wall-clock budget measured from the first attempt.
    pub max_elapsed: Duration,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            max_elapsed: Duration::from_secs(4 * 60 * 60),
            backoff_step: DEFAULT_STEP,
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// the policy's budget is spent.
///
/// A backoff sleep never runs past the remaining wall-clock budget.
///
/// # Errors
///
/// Returns the operation's error unchanged when it is not retriable, or
/// [`ScraperError::RetriesExhausted`] wrapping the last transient error once
/// `max_attempts` or `max_elapsed` is reached.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let started = Instant::now();
    let mut backoff = CollisionBackoff::new(policy.backoff_step);
    let mut delay = backoff.next_delay();
    let mut attempt = 0u32;

    loop {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retriable() => return Err(err),
            Err(err) => err,
        };

        let elapsed = started.elapsed();
        if attempt >= policy.max_attempts || elapsed >= policy.max_elapsed {
            tracing::error!(
                url,
                attempt,
                elapsed_secs = elapsed.as_secs(),
                error = %err,
                "retry budget exhausted"
            );
            return Err(ScraperError::RetriesExhausted {
                url: url.to_owned(),
                attempts: attempt,
                elapsed_secs: elapsed.as_secs(),
                last: Box::new(err),
            });
        }

        delay = backoff
            .next_delay()
            .min(policy.max_elapsed.saturating_sub(elapsed));
        tracing::warn!(
            url,
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient error, backing off"
        );
    }
}
