//! Bounded retry with exponential backoff around the generator call.
//!
//! The policy is plain data (attempt budget, backoff schedule, the set of
//! retryable [`GenerationErrorKind`]s) so it can live in
//! [`crate::config::ManuscriptConfig`], be printed, and be swapped for a
//! zero-delay variant in tests.
//!
//! With the defaults the schedule is: attempt 1, wait 2 s, attempt 2, wait
//! 4 s, attempt 3, wait 8 s, attempt 4. Waits are capped at `max_backoff`.

use crate::error::{GenerationError, GenerationErrorKind};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Default: 4.
    pub max_attempts: u32,
    /// Wait before the first retry. Default: 2 s.
    pub initial_backoff: Duration,
    /// Upper bound for any single wait. Default: 20 s.
    pub max_backoff: Duration,
    /// Error kinds worth another attempt. Default: rate limit, timeout,
    /// transient API error.
    pub retry_on: Vec<GenerationErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(20),
            retry_on: vec![
                GenerationErrorKind::RateLimited,
                GenerationErrorKind::Timeout,
                GenerationErrorKind::TransientApi,
            ],
        }
    }
}

/// Emitted before each wait so callers can surface retries to the user.
#[derive(Debug, Clone)]
pub struct RetryNotice<'a> {
    /// The attempt that just failed (1-indexed).
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a GenerationError,
}

/// A successful value and how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// The error that ended the loop and how many attempts were made.
#[derive(Debug, Clone)]
pub struct RetryFailure {
    pub error: GenerationError,
    pub attempts: u32,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable(&self, error: &GenerationError) -> bool {
        self.retry_on.contains(&error.kind)
    }

    /// Wait before retry number `retry` (1-indexed): `initial × 2^(retry-1)`,
    /// capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<Retried<T>, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        self.run_observed(op, |_| {}).await
    }

    /// Like [`RetryPolicy::run`], calling `observe` before every wait.
    pub async fn run_observed<T, F, Fut, O>(
        &self,
        mut op: F,
        mut observe: O,
    ) -> Result<Retried<T>, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
        O: FnMut(&RetryNotice<'_>),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => {
                    debug!("Generator succeeded on attempt {}", attempt);
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => {
                    if !self.is_retryable(&error) || attempt >= max_attempts {
                        warn!(
                            "Generator failed on attempt {}/{}, giving up: {}",
                            attempt, max_attempts, error
                        );
                        return Err(RetryFailure {
                            error,
                            attempts: attempt,
                        });
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        "Generator attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, max_attempts, error, delay
                    );
                    observe(&RetryNotice {
                        attempt,
                        max_attempts,
                        delay,
                        error: &error,
                    });
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            ..RetryPolicy::default()
        }
    }

    fn transient() -> GenerationError {
        GenerationError::new(GenerationErrorKind::RateLimited, "429")
    }

    #[test]
    fn default_schedule() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 4);
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(3), Duration::from_secs(8));
        assert_eq!(p.backoff(4), Duration::from_secs(16));
        assert_eq!(p.backoff(5), Duration::from_secs(20));
        assert_eq!(p.backoff(40), Duration::from_secs(20));
    }

    #[test]
    fn default_retryable_kinds() {
        let p = RetryPolicy::default();
        assert!(p.is_retryable(&transient()));
        assert!(p.is_retryable(&GenerationError::new(GenerationErrorKind::Timeout, "t")));
        assert!(p.is_retryable(&GenerationError::new(GenerationErrorKind::TransientApi, "503")));
        assert!(!p.is_retryable(&GenerationError::new(GenerationErrorKind::Authentication, "401")));
        assert!(!p.is_retryable(&GenerationError::new(GenerationErrorKind::QuotaExhausted, "q")));
    }

    #[tokio::test]
    async fn succeeds_on_fourth_attempt_after_three_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n <= 3 {
                        Err(transient())
                    } else {
                        Ok("manuscript")
                    }
                }
            })
            .await
            .expect("fourth attempt succeeds");

        assert_eq!(result.value, "manuscript");
        assert_eq!(result.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let failure = fast_policy()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(transient()) }
            })
            .await
            .expect_err("all attempts fail");

        assert_eq!(failure.attempts, 4);
        assert_eq!(failure.error.kind, GenerationErrorKind::RateLimited);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_transient_fails_immediately_without_delay() {
        // Default policy: a retry would sleep 2 s.
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let failure = RetryPolicy::default()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(GenerationError::new(
                        GenerationErrorKind::Authentication,
                        "401 Unauthorized",
                    ))
                }
            })
            .await
            .expect_err("auth errors are not retried");

        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(failure.error.kind, GenerationErrorKind::Authentication);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn observer_sees_each_retry() {
        let mut seen = Vec::new();
        let calls = AtomicU32::new(0);
        let _ = fast_policy()
            .run_observed(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { if n < 3 { Err(transient()) } else { Ok(()) } }
                },
                |notice| seen.push((notice.attempt, notice.delay)),
            )
            .await;

        assert_eq!(
            seen,
            vec![(1, Duration::from_millis(1)), (2, Duration::from_millis(2))]
        );
    }

    #[tokio::test]
    async fn none_policy_single_attempt() {
        let failure = RetryPolicy::none()
            .run(|| async { Err::<(), _>(transient()) })
            .await
            .expect_err("no retries");
        assert_eq!(failure.attempts, 1);
    }
}
