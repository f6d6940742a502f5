//! CLI for LSR.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use lsr_core::config::{self, LsrConfig};
use std::path::PathBuf;

use commands::{
    run_clean, run_completions, run_init, run_kill, run_retry, run_schedule, run_show_config,
    run_start, run_stop, RunOptions,
};

/// Top-level CLI for LSR.
#[derive(Debug, Parser)]
#[command(name = "lsr")]
#[command(about = "LSR: retry-with-backoff runner for LocalStack setup", long_about = None)]
pub struct Cli {
    /// Append logs to ~/.local/state/lsr/lsr.log instead of stderr.
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Read configuration from PATH instead of ~/.config/lsr/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a command, retrying with exponential backoff until it succeeds.
    Run {
        /// Maximum number of attempts, including the first (default from config, else 10).
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        max_retries: Option<u32>,

        /// Error kind that stops retrying at once, e.g. `exit:2` or `not-found`. Repeatable.
        #[arg(long = "fail-fast", value_name = "KIND")]
        fail_fast: Vec<String>,

        /// Cap a single backoff wait at MS milliseconds.
        #[arg(long, value_name = "MS")]
        max_delay_ms: Option<u64>,

        /// Give up (cancelled) if the command has not succeeded after SECS seconds.
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,

        /// Program to run.
        program: String,

        /// Arguments passed to the program (put them after `--`).
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Print the backoff schedule for the effective retry policy.
    Schedule {
        /// Maximum number of attempts, including the first.
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        max_retries: Option<u32>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Write the default LocalStack docker-compose file.
    Init {
        /// Directory for the compose file (default: config working_dir, else ./localstack).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Start LocalStack (`docker compose up -d`), retrying until it comes up.
    Start {
        /// Directory holding the compose file (default: config working_dir, else ./localstack).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Stop LocalStack (`docker compose down`), keeping the .localstack data directory.
    Stop {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Force LocalStack down and delete the .localstack data directory.
    Kill {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Delete the .localstack data directory.
    Clean {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Show the config file path and effective configuration.
    ShowConfig,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        if let CliCommand::Completions { shell } = self.command {
            return run_completions(shell);
        }

        let cfg = self.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Run {
                max_retries,
                fail_fast,
                max_delay_ms,
                timeout_secs,
                program,
                args,
            } => run_retry(
                &cfg,
                RunOptions {
                    max_retries,
                    fail_fast,
                    max_delay_ms,
                    timeout_secs,
                    program,
                    args,
                },
            )?,
            CliCommand::Schedule { max_retries, json } => run_schedule(&cfg, max_retries, json)?,
            CliCommand::Init { dir } => run_init(&cfg, dir.as_deref())?,
            CliCommand::Start { dir } => run_start(&cfg, dir.as_deref())?,
            CliCommand::Stop { dir } => run_stop(&cfg, dir.as_deref())?,
            CliCommand::Kill { dir } => run_kill(&cfg, dir.as_deref())?,
            CliCommand::Clean { dir } => run_clean(&cfg, dir.as_deref())?,
            CliCommand::ShowConfig => run_show_config(&cfg, self.config_file.as_deref())?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }

    fn load_config(&self) -> Result<LsrConfig> {
        match &self.config_file {
            Some(path) => config::load_from(path),
            None => config::load_or_init(),
        }
    }
}

#[cfg(test)]
mod tests;
