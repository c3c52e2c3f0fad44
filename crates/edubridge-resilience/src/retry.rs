// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use edubridge_config::model::LoaderConfig;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }

    /// Delay before attempt `failed + 1`, after `failed` failures (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        let doublings = failed.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Result of a retried operation plus what it took to get there.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, at least one.
    pub attempts: u32,
    /// Sum of the backoff delays slept.
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `op` until it succeeds, fails with an error `is_retryable` rejects, or
/// the policy's attempts run out.
///
/// `op` receives the 1-based attempt number. There is no sleep after the final attempt.
pub async fn retry<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    is_retryable: C,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut total_delay = Duration::ZERO;
    let mut attempt = 1;

    loop {
        let result = op(attempt).await;
        let error = match result {
            Ok(value) => {
                debug!(attempt, "operation succeeded");
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    total_delay,
                };
            }
            Err(e) => e,
        };

        if !is_retryable(&error) || attempt >= max_attempts {
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
                total_delay,
            };
        }

        let delay = policy.delay_after(attempt);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure, will retry"
        );
        tokio::time::sleep(delay).await;
        total_delay += delay;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use edubridge_core::PortalError;
    use tokio::time::Instant;

    use super::*;

    fn transient() -> PortalError {
        PortalError::Transport {
            message: "connection reset by peer".into(),
            source: None,
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        };
        let delays: Vec<u64> = (1..=6).map(|n| policy.delay_after(n).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16, 30, 30]);
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_then_success() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let outcome = retry(&RetryPolicy::default(), PortalError::is_transient, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(transient())
                } else {
                    Ok("session")
                }
            }
        })
        .await;

        assert_eq!(outcome.result.unwrap(), "session");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.total_delay, Duration::from_secs(6));
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_without_trailing_sleep() {
        let started = Instant::now();
        let outcome: RetryOutcome<(), _> =
            retry(&RetryPolicy::default(), PortalError::is_transient, |_| async {
                Err(transient())
            })
            .await;

        assert!(outcome.result.unwrap_err().is_transient());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.total_delay, Duration::from_secs(6));
        assert!(started.elapsed() < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_fails_after_one_attempt() {
        let outcome: RetryOutcome<(), _> =
            retry(&RetryPolicy::default(), PortalError::is_transient, |_| async {
                Err(PortalError::Unauthorized("bad password".into()))
            })
            .await;

        assert!(!outcome.is_ok());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.total_delay, Duration::ZERO);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let outcome = retry(&policy, |_: &String| true, |_| async { Ok::<_, String>(1) }).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result, Ok(1));
    }
}
