//! Retry loop: run a closure until it succeeds, fails fast, runs out of
//! attempts, or is cancelled.

use super::cancel::{CancelToken, Cancelled};
use super::classify::{Classify, FailFastSet};
use super::error::RetryError;
use super::policy::RetryPolicy;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Performs the blocking wait between attempts.
pub trait Sleeper {
    /// Wait for `delay`, or return `Err(Cancelled)` if `cancel` fires first.
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Result<(), Cancelled>;
}

/// Blocks the calling thread on the cancel token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        cancel.wait(delay)
    }
}

/// Retry executor: a policy, a fail-fast set, a cancel token and a sleeper.
///
/// Holds no state between runs; one `Retry` can be shared by many threads.
#[derive(Clone)]
pub struct Retry {
    policy: RetryPolicy,
    fail_fast: FailFastSet,
    cancel: CancelToken,
    sleeper: Arc<dyn Sleeper + Send + Sync>,
}

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("policy", &self.policy)
            .field("fail_fast", &self.fail_fast)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl Retry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            fail_fast: FailFastSet::new(),
            cancel: CancelToken::new(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn fail_fast(mut self, kinds: FailFastSet) -> Self {
        self.fail_fast = kinds;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + Send + Sync + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Token observed by this executor. Operations that block (child
    /// processes) watch it so a cancel can interrupt an attempt in flight.
    pub fn cancel_handle(&self) -> &CancelToken {
        &self.cancel
    }

    /// Runs `op` until it succeeds or the run terminates.
    ///
    /// Every failure is logged. A failure that arrives after the token was
    /// cancelled ends the run as cancelled. A failure whose kind (or direct cause's kind)
    /// is in the fail-fast set ends the run immediately; any other failure
    /// waits `policy.backoff_delay` and tries again until `max_retries`
    /// attempts have been made. No wait follows the final attempt.
    pub fn execute<T, E, F>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        let budget = self.policy.attempt_budget();
        let mut rng = rand::thread_rng();
        let mut last: Option<E> = None;
        let mut attempt = 1u32;
        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!(attempt, "cancelled before attempt");
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                    last,
                });
            }

            let err = match op() {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            tracing::warn!(attempt, kind = %err.kind(), "Error: {}", err);

            if self.cancel.is_cancelled() {
                tracing::warn!(attempt, "cancelled during attempt");
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last: Some(err),
                });
            }
            if self.fail_fast.matches(&err) {
                return Err(RetryError::FailFast {
                    attempt,
                    source: err,
                });
            }
            if attempt >= budget {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.policy.backoff_delay(attempt - 1, &mut rng);
            tracing::debug!(attempt, ?delay, "backing off");
            if self.sleeper.sleep(delay, &self.cancel).is_err() {
                tracing::warn!(attempt, "cancelled during backoff");
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last: Some(err),
                });
            }
            tracing::info!(attempt, "Retrying...");
            last = Some(err);
            attempt += 1;
        }
    }
}

/// Runs `op` with the default policy (10 attempts) and an empty fail-fast set.
pub fn execute<T, E, F>(op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Classify + fmt::Display,
{
    Retry::default().execute(op)
}

/// Runs `op` with an explicit policy and fail-fast set.
pub fn execute_with<T, E, F>(
    policy: &RetryPolicy,
    fail_fast: &FailFastSet,
    op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Classify + fmt::Display,
{
    Retry::new(*policy).fail_fast(fail_fast.clone()).execute(op)
}
