//! Fixed-delay retry and cancellation helpers shared by the feed fetcher and
//! the task publisher.
//!
//! [`retry_fixed`] runs an operation up to `policy.max_attempts` times with a
//! constant pause between attempts. Intermediate failures are logged at
//! `warn`, the final one at `error`, and the last error is returned to the
//! caller. A cancelled token ends the loop immediately, including mid-sleep.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Returned when a [`CancellationToken`] fires before an operation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Three attempts, two seconds apart.
    pub const STANDARD: Self = Self {
        max_attempts: 3,
        delay: Duration::from_secs(2),
    };

    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Race `future` against `cancel`.
///
/// # Errors
///
/// Returns [`Cancelled`] if the token fires first. The future is dropped.
pub async fn cancellable<T, Fut>(cancel: &CancellationToken, future: Fut) -> Result<T, Cancelled>
where
    Fut: Future<Output = T>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Cancelled),
        value = future => Ok(value),
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
///
/// `operation` receives the 1-based attempt number. `what` labels the log
/// lines (e.g. `"publish to buildSummary"`).
///
/// # Errors
///
/// Returns the error of the last attempt, or `E::from(Cancelled)` when the
/// token fires during an attempt or during the pause between attempts.
pub async fn retry_fixed<T, E, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    what: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + From<Cancelled>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let err = match cancellable(cancel, operation(attempt)).await? {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= max_attempts {
            tracing::error!(
                attempt,
                max_attempts,
                error = %err,
                "{what} failed on final attempt"
            );
            return Err(err);
        }

        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "{what} failed, retrying"
        );
        cancellable(cancel, tokio::time::sleep(policy.delay)).await?;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Boom,
        Cancelled,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl From<Cancelled> for TestError {
        fn from(_: Cancelled) -> Self {
            TestError::Cancelled
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_makes_exactly_max_attempts_two_seconds_apart() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let result: Result<(), TestError> = retry_fixed(RetryPolicy::STANDARD, &cancel, "test", |_| {
            let calls = Arc::clone(&calls);
            let stamps = Arc::clone(&stamps);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                stamps.lock().unwrap().push(started.elapsed());
                Err(TestError::Boom)
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Boom));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let stamps = stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 3);
        for pair in stamps.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(
                gap >= Duration::from_secs(2) && gap < Duration::from_millis(2_100),
                "expected ~2s between attempts, got {gap:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let result: Result<u32, TestError> =
            retry_fixed(RetryPolicy::STANDARD, &cancel, "test", |attempt| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(TestError::Boom)
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_does_not_retry() {
        let cancel = CancellationToken::new();
        let result: Result<&str, TestError> =
            retry_fixed(RetryPolicy::STANDARD, &cancel, "test", |_| async { Ok("done") }).await;
        assert_eq!(result, Ok("done"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let result: Result<(), TestError> = retry_fixed(RetryPolicy::STANDARD, &cancel, "test", |_| {
            let calls = Arc::clone(&calls);
            let trigger = trigger.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                trigger.cancel();
                Err(TestError::Boom)
            }
        })
        .await;

        assert_eq!(result, Err(TestError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellable_returns_cancelled_for_fired_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = cancellable(&cancel, std::future::pending::<()>()).await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn zero_attempt_policy_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let result: Result<(), TestError> =
            retry_fixed(RetryPolicy::new(0, Duration::ZERO), &cancel, "test", |_| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Boom)
                }
            })
            .await;
        assert_eq!(result, Err(TestError::Boom));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
