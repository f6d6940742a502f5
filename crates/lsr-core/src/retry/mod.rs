//! Retry-with-backoff executor.
//!
//! Every call to an unreliable remote operation goes through [`Retry`]: the
//! operation is attempted up to `max_retries` times, with `base * e^n` backoff
//! plus jitter between attempts. Errors whose [`ErrorKind`] (or whose direct
//! cause's kind) is in the caller's [`FailFastSet`] end the run at once.
//! A [`CancelToken`] stops a run before the next attempt or mid-wait.

mod cancel;
mod classify;
mod error;
mod policy;
mod run;

pub use cancel::{CancelToken, Cancelled};
pub use classify::{io_error_kind, Classify, ErrorKind, FailFastSet};
pub use error::RetryError;
pub use policy::{BackoffStep, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use run::{execute, execute_with, Retry, Sleeper, ThreadSleeper};
