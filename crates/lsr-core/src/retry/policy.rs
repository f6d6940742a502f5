use rand::Rng;
use serde::Serialize;
use std::time::Duration;

/// Default number of attempts (including the first).
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Exponential backoff policy: `base_delay * e^n` plus symmetric jitter.
///
/// There is no upper bound on the delay unless `max_delay` is set; with the
/// defaults the last wait (after the ninth failure) is close to fifty minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Values below 1 are
    /// treated as 1.
    pub max_retries: u32,
    /// Delay unit multiplied by `e^n`.
    pub base_delay: Duration,
    /// Half-width of the uniform jitter window `[-jitter, +jitter)`.
    pub jitter: Duration,
    /// Optional clamp on a single wait.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(1000),
            max_delay: None,
        }
    }
}

/// One entry of a policy's backoff schedule, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackoffStep {
    /// The wait follows this (1-based) failed attempt.
    pub after_attempt: u32,
    pub base_ms: u64,
    /// Smallest possible wait (inclusive).
    pub min_ms: u64,
    /// Largest possible wait (exclusive unless clamped).
    pub max_ms: u64,
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Policy that never waits. Used where only the attempt budget matters.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            max_delay: None,
        }
    }

    pub(crate) fn attempt_budget(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Base delay (no jitter, no clamp) after `attempt` prior failures (0-based).
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        millis_to_duration(self.base_millis(attempt))
    }

    /// Delay to wait after `attempt` prior failures (0-based): base plus a
    /// uniform integer jitter in `[-jitter, +jitter)` ms, floored at zero and
    /// clamped to `max_delay` when set.
    pub fn backoff_delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter_ms = self.jitter_millis();
        let offset = if jitter_ms > 0 {
            rng.gen_range(-jitter_ms..jitter_ms)
        } else {
            0
        };
        self.clamp(millis_to_duration(self.base_millis(attempt) + offset as f64))
    }

    /// Every wait this policy can incur, in order.
    pub fn schedule(&self) -> Vec<BackoffStep> {
        let jitter_ms = self.jitter_millis() as u64;
        (0..self.attempt_budget() - 1)
            .map(|n| {
                let base = duration_to_millis(self.base_delay_for(n));
                let min = duration_to_millis(self.clamp(Duration::from_millis(
                    base.saturating_sub(jitter_ms),
                )));
                let max = duration_to_millis(self.clamp(Duration::from_millis(
                    base.saturating_add(jitter_ms),
                )));
                BackoffStep {
                    after_attempt: n + 1,
                    base_ms: base,
                    min_ms: min,
                    max_ms: max,
                }
            })
            .collect()
    }

    fn base_millis(&self, attempt: u32) -> f64 {
        self.base_delay.as_secs_f64() * 1000.0 * f64::from(attempt).exp()
    }

    fn jitter_millis(&self) -> i64 {
        i64::try_from(self.jitter.as_millis()).unwrap_or(i64::MAX)
    }

    fn clamp(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }
}

fn millis_to_duration(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

fn duration_to_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
