//! External commands (docker compose and friends) as retryable operations.

use crate::retry::{CancelToken, Classify, ErrorKind, Retry, RetryError};
use std::fmt;
use std::io;
use std::process::{Child, Command, ExitStatus};
use std::time::Duration;

/// How often a running child is checked for exit while waiting on the cancel token.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Failure of a single command run.
#[derive(Debug)]
pub enum CommandError {
    /// The program could not be started (missing binary, permissions, ...).
    Spawn { program: String, source: io::Error },
    /// The program ran and exited with a non-zero status.
    Exit(i32),
    /// The program was terminated by a signal.
    Signal,
    /// The run was cancelled while the program was running; it was killed.
    Cancelled { program: String },
    /// Waiting on or killing a started program failed.
    Wait { program: String, source: io::Error },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Spawn { program, source } => {
                write!(f, "failed to start {}: {}", program, source)
            }
            CommandError::Exit(code) => write!(f, "command exited with status {}", code),
            CommandError::Signal => write!(f, "command terminated by signal"),
            CommandError::Cancelled { program } => write!(f, "{} killed: run cancelled", program),
            CommandError::Wait { program, source } => {
                write!(f, "failed waiting on {}: {}", program, source)
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Spawn { source, .. } | CommandError::Wait { source, .. } => Some(source),
            CommandError::Exit(_) | CommandError::Signal | CommandError::Cancelled { .. } => None,
        }
    }
}

impl Classify for CommandError {
    fn kind(&self) -> ErrorKind {
        match self {
            CommandError::Spawn { .. } => ErrorKind::from_static("spawn"),
            CommandError::Exit(code) => exit_kind(*code),
            CommandError::Signal => ErrorKind::from_static("signal"),
            CommandError::Cancelled { .. } => ErrorKind::from_static("cancelled"),
            CommandError::Wait { .. } => ErrorKind::from_static("wait"),
        }
    }

    fn cause(&self) -> Option<&dyn Classify> {
        match self {
            CommandError::Spawn { source, .. } | CommandError::Wait { source, .. } => Some(source),
            CommandError::Exit(_) | CommandError::Signal | CommandError::Cancelled { .. } => None,
        }
    }
}

/// Kind for a non-zero exit status, e.g. `exit:3`.
pub fn exit_kind(code: i32) -> ErrorKind {
    ErrorKind::new(format!("exit:{}", code))
}

/// Run `program` once with inherited stdio.
///
/// The child is killed (and reaped) as soon as `cancel` fires, so a hung
/// program cannot outlive the run.
pub fn run_command(
    program: &str,
    args: &[String],
    cancel: &CancelToken,
) -> Result<(), CommandError> {
    tracing::debug!(program, ?args, "running command");
    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;
    let status = wait_or_kill(&mut child, cancel).map_err(|source| CommandError::Wait {
        program: program.to_string(),
        source,
    })?;
    match status {
        None => {
            tracing::warn!(program, "cancelled, child killed");
            Err(CommandError::Cancelled {
                program: program.to_string(),
            })
        }
        Some(status) => match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(CommandError::Exit(code)),
            None => Err(CommandError::Signal),
        },
    }
}

/// Wait for `child` to exit. Returns `Ok(None)` after killing it on cancel.
fn wait_or_kill(child: &mut Child, cancel: &CancelToken) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if cancel.wait(POLL_INTERVAL).is_err() {
            // The child may have exited between try_wait and kill.
            if let Err(err) = child.kill() {
                if err.kind() != io::ErrorKind::InvalidInput {
                    return Err(err);
                }
            }
            child.wait()?;
            return Ok(None);
        }
    }
}

/// Run `program` under `retry` until it exits successfully. Cancelling the
/// retry's token also kills a running attempt.
pub fn run_with_retry(
    retry: &Retry,
    program: &str,
    args: &[String],
) -> Result<(), RetryError<CommandError>> {
    let cancel = retry.cancel_handle();
    retry.execute(|| run_command(program, args, cancel))
}
