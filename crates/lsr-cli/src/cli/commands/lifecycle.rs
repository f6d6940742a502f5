//! `lsr start|stop|kill|clean` – drive the LocalStack docker-compose stack.

use anyhow::{bail, Context, Result};
use lsr_core::compose;
use lsr_core::config::LsrConfig;
use lsr_core::process;
use lsr_core::retry::{FailFastSet, Retry};
use std::path::{Path, PathBuf};

const DOCKER: &str = "docker";

/// Stack directory: `--dir` if given, else the configured or default one.
pub(super) fn stack_dir(cfg: &LsrConfig, dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => Ok(compose::compose_dir(cfg, &std::env::current_dir()?)),
    }
}

pub fn run_start(cfg: &LsrConfig, dir: Option<&Path>) -> Result<()> {
    let dir = stack_dir(cfg, dir)?;
    compose_with_retry(cfg, &dir, &["up", "-d"], DOCKER)?;
    tracing::info!("LocalStack Started");
    Ok(())
}

pub fn run_stop(cfg: &LsrConfig, dir: Option<&Path>) -> Result<()> {
    let dir = stack_dir(cfg, dir)?;
    compose_with_retry(cfg, &dir, &["down"], DOCKER)?;
    tracing::info!("LocalStack Stopped");
    Ok(())
}

/// Forced `down` followed by removal of the data directory.
pub fn run_kill(cfg: &LsrConfig, dir: Option<&Path>) -> Result<()> {
    let dir = stack_dir(cfg, dir)?;
    compose_with_retry(
        cfg,
        &dir,
        &["down", "--remove-orphans", "--timeout", "0"],
        DOCKER,
    )?;
    clean(&dir)?;
    tracing::info!("LocalStack Stopped");
    Ok(())
}

pub fn run_clean(cfg: &LsrConfig, dir: Option<&Path>) -> Result<()> {
    let dir = stack_dir(cfg, dir)?;
    clean(&dir)
}

fn clean(dir: &Path) -> Result<()> {
    tracing::info!("Cleaning the LocalStack data directory");
    compose::clean_data(dir).with_context(|| {
        format!(
            "error deleting the LocalStack data sub-directory in {}",
            dir.display()
        )
    })?;
    Ok(())
}

/// Run `<docker> compose -f <file> <subcommand>` under the configured policy.
/// A missing docker binary fails fast.
fn compose_with_retry(
    cfg: &LsrConfig,
    dir: &Path,
    subcommand: &[&str],
    docker: &str,
) -> Result<()> {
    let file = compose::compose_file(dir);
    if !file.is_file() {
        bail!(
            "no compose file at {}; run `lsr init` first",
            file.display()
        );
    }
    let fail_fast: FailFastSet = ["not-found", "permission-denied"].into_iter().collect();
    let retry = Retry::new(cfg.retry_policy()?).fail_fast(fail_fast);
    let args = compose::compose_args(dir, subcommand);
    process::run_with_retry(&retry, docker, &args)
        .with_context(|| format!("{} compose {}", docker, subcommand.join(" ")))?;
    Ok(())
}
