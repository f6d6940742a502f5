//! Terminal failures raised by the retry executor.

use super::classify::{Classify, ErrorKind};
use std::fmt;

/// Why a retry run gave up.
///
/// Every variant except a cancellation observed before the first attempt
/// carries the operation error that ended the run.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with a kind in the fail-fast set.
    FailFast {
        /// 1-based attempt that produced the error.
        attempt: u32,
        source: E,
    },
    /// Every permitted attempt failed.
    Exhausted { attempts: u32, last: E },
    /// A cancel request stopped the run before it could finish.
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    pub const FAIL_FAST: ErrorKind = ErrorKind::from_static("fail-fast");
    pub const EXHAUSTED: ErrorKind = ErrorKind::from_static("exhausted");
    pub const CANCELLED: ErrorKind = ErrorKind::from_static("cancelled");

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::FailFast { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The operation error behind this failure, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::FailFast { source, .. } => Some(source),
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled { last, .. } => last.as_ref(),
        }
    }

    pub fn into_last_error(self) -> Option<E> {
        match self {
            RetryError::FailFast { source, .. } => Some(source),
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Cancelled { last, .. } => last,
        }
    }

    pub fn is_fail_fast(&self) -> bool {
        matches!(self, RetryError::FailFast { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::FailFast { attempt, .. } => {
                write!(f, "attempt {} failed with a non-retryable error", attempt)
            }
            RetryError::Exhausted { attempts, .. } => {
                write!(f, "maximum retry attempts reached ({})", attempts)
            }
            RetryError::Cancelled { attempts, .. } => {
                write!(f, "retry cancelled after {} attempt(s)", attempts)
            }
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl<E: Classify> Classify for RetryError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            RetryError::FailFast { .. } => Self::FAIL_FAST,
            RetryError::Exhausted { .. } => Self::EXHAUSTED,
            RetryError::Cancelled { .. } => Self::CANCELLED,
        }
    }

    fn cause(&self) -> Option<&dyn Classify> {
        self.last_error().map(|e| e as &dyn Classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn exhausted_message_is_distinct_and_chains_last_error() {
        let err: RetryError<io::Error> = RetryError::Exhausted {
            attempts: 3,
            last: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
        };
        assert_eq!(err.to_string(), "maximum retry attempts reached (3)");
        assert_eq!(err.source().unwrap().to_string(), "connect timed out");
        assert_eq!(err.kind(), RetryError::<io::Error>::EXHAUSTED);
        assert_eq!(Classify::cause(&err).unwrap().kind().as_str(), "timed-out");
    }

    #[test]
    fn fail_fast_chains_wrapped_error() {
        let err = RetryError::FailFast {
            attempt: 1,
            source: io::Error::new(io::ErrorKind::InvalidInput, "bad table name"),
        };
        assert_eq!(err.to_string(), "attempt 1 failed with a non-retryable error");
        assert_eq!(err.source().unwrap().to_string(), "bad table name");
        assert!(err.is_fail_fast());
        assert_eq!(err.attempts(), 1);
    }

    #[test]
    fn cancelled_before_first_attempt_has_no_source() {
        let err: RetryError<io::Error> = RetryError::Cancelled {
            attempts: 0,
            last: None,
        };
        assert!(err.source().is_none());
        assert!(err.is_cancelled());
        assert!(!err.is_exhausted());
        assert!(err.into_last_error().is_none());
    }
}
