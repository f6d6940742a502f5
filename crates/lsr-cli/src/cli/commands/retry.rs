//! `lsr run -- <program> [args...]` – run a command under the retry executor.

use anyhow::{Context, Result};
use lsr_core::config::LsrConfig;
use lsr_core::process;
use lsr_core::retry::{CancelToken, FailFastSet, Retry, RetryPolicy};
use std::time::Duration;

/// Flags of the `run` subcommand.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub max_retries: Option<u32>,
    pub fail_fast: Vec<String>,
    pub max_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub program: String,
    pub args: Vec<String>,
}

/// Config policy with command-line overrides applied.
pub fn effective_policy(cfg: &LsrConfig, opts: &RunOptions) -> Result<RetryPolicy> {
    let mut policy = cfg.retry_policy()?;
    if let Some(n) = opts.max_retries {
        policy.max_retries = n;
    }
    if let Some(ms) = opts.max_delay_ms {
        policy.max_delay = Some(Duration::from_millis(ms));
    }
    Ok(policy)
}

pub fn run_retry(cfg: &LsrConfig, opts: RunOptions) -> Result<()> {
    let policy = effective_policy(cfg, &opts)?;
    let fail_fast: FailFastSet = opts.fail_fast.iter().cloned().collect();

    let token = CancelToken::new();
    let watchdog = opts
        .timeout_secs
        .map(|secs| token.cancel_after(Duration::from_secs(secs)));

    let retry = Retry::new(policy)
        .fail_fast(fail_fast)
        .cancel_token(token.clone());
    tracing::debug!(?retry, "starting run");

    let result = process::run_with_retry(&retry, &opts.program, &opts.args);

    // Wakes the watchdog so it exits without waiting out the timeout.
    token.cancel();
    if let Some(handle) = watchdog {
        if handle.join().is_err() {
            tracing::warn!("timeout watchdog panicked");
        }
    }

    result.with_context(|| format!("running {}", opts.program))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsr_core::config::RetryConfig;

    #[test]
    fn cli_flags_override_config() {
        let cfg = LsrConfig {
            retry: Some(RetryConfig {
                max_retries: 4,
                ..RetryConfig::default()
            }),
            ..LsrConfig::default()
        };
        let opts = RunOptions {
            max_retries: Some(2),
            max_delay_ms: Some(1500),
            ..RunOptions::default()
        };
        let policy = effective_policy(&cfg, &opts).unwrap();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_delay, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn config_policy_used_without_flags() {
        let cfg = LsrConfig::default();
        let policy = effective_policy(&cfg, &RunOptions::default()).unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[cfg(unix)]
    #[test]
    fn fail_fast_flag_reports_command_error() {
        let cfg = LsrConfig::default();
        let opts = RunOptions {
            fail_fast: vec!["exit:4".to_string()],
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 4".to_string()],
            ..RunOptions::default()
        };
        let err = run_retry(&cfg, opts).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("running sh"), "{msg}");
        assert!(msg.contains("status 4"), "{msg}");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_cancels_a_hung_command() {
        let cfg = LsrConfig::default();
        let opts = RunOptions {
            timeout_secs: Some(1),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
            ..RunOptions::default()
        };
        let start = std::time::Instant::now();
        let err = run_retry(&cfg, opts).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("retry cancelled after 1 attempt(s)"), "{msg}");
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn quick_success_does_not_wait_for_the_timeout() {
        let cfg = LsrConfig::default();
        let opts = RunOptions {
            timeout_secs: Some(30),
            program: "true".to_string(),
            ..RunOptions::default()
        };
        let start = std::time::Instant::now();
        run_retry(&cfg, opts).unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
