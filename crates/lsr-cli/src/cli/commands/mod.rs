//! CLI command handlers, one per file.

mod completions;
mod init;
mod lifecycle;
mod retry;
mod schedule;
mod show_config;

pub use completions::run_completions;
pub use init::run_init;
pub use lifecycle::{run_clean, run_kill, run_start, run_stop};
pub use retry::{run_retry, RunOptions};
pub use schedule::run_schedule;
pub use show_config::run_show_config;
