//! Cancellation for retry runs: a shared token with a cancellable blocking wait.
//!
//! The executor checks the token before every attempt, and the default sleeper
//! waits on it so a cancel wakes a pending backoff immediately instead of
//! after the full delay.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Returned when a wait or attempt is stopped by a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

#[derive(Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Cloneable cancellation flag. All clones observe the same state.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every thread blocked in [`CancelToken::wait`].
    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `timeout`, returning early with `Err(Cancelled)` if the token
    /// is (or becomes) cancelled.
    pub fn wait(&self, timeout: Duration) -> Result<(), Cancelled> {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            // Unrepresentable deadline: only a cancel can end this wait.
            let _guard = self
                .inner
                .cond
                .wait_while(cancelled, |c| !*c)
                .unwrap_or_else(PoisonError::into_inner);
            return Err(Cancelled);
        };

        loop {
            if *cancelled {
                return Err(Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            let (guard, _) = self
                .inner
                .cond
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
    }

    /// Spawn a watchdog thread that cancels this token after `after`.
    ///
    /// The watchdog exits early (without cancelling again) if the token is
    /// cancelled by someone else first.
    pub fn cancel_after(&self, after: Duration) -> JoinHandle<()> {
        let token = self.clone();
        thread::spawn(move || {
            if token.wait(after).is_ok() {
                tracing::debug!(?after, "deadline reached, cancelling");
                token.cancel();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert_eq!(token.wait(Duration::from_millis(1)), Ok(()));
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.wait(Duration::from_secs(60)), Err(Cancelled));
    }

    #[test]
    fn cancel_wakes_a_long_wait() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let start = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });
        assert_eq!(token.wait(Duration::from_secs(60)), Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(30));
        handle.join().unwrap();
    }

    #[test]
    fn unbounded_wait_ends_on_cancel() {
        let token = CancelToken::new();
        let _watchdog = token.cancel_after(Duration::from_millis(10));
        assert_eq!(token.wait(Duration::MAX), Err(Cancelled));
    }

    #[test]
    fn cancel_after_fires() {
        let token = CancelToken::new();
        token.cancel_after(Duration::from_millis(5)).join().unwrap();
        assert!(token.is_cancelled());
    }
}
