//! Default LocalStack docker-compose file.

use crate::config::LsrConfig;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const COMPOSE_FILE_NAME: &str = "localstack-docker-compose.yml";

/// Directory used when the config has no `working_dir`.
pub const DEFAULT_DIR_NAME: &str = "localstack";

/// Data sub-directory LocalStack persists state into.
pub const DATA_DIR_NAME: &str = ".localstack";

const DEFAULT_COMPOSE: &str = r#"version: "3.8"

services:
  localstack:
    container_name: localstack
    image: localstack/localstack
    ports:
      - "4566:4566"
    environment:
      - SERVICES=cloudformation,dynamodb,s3,sns,sqs
      - DEFAULT_REGION=us-east-1
      - DEBUG=0
    volumes:
      - "/var/run/docker.sock:/var/run/docker.sock"
"#;

/// Directory the compose file lives in: the configured working dir, or
/// `<project_dir>/localstack`.
pub fn compose_dir(cfg: &LsrConfig, project_dir: &Path) -> PathBuf {
    match &cfg.working_dir {
        Some(dir) => dir.clone(),
        None => project_dir.join(DEFAULT_DIR_NAME),
    }
}

/// Write the default compose file into `dir`, creating the directory.
///
/// Never overwrites: an existing file yields `io::ErrorKind::AlreadyExists`.
pub fn init_compose(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(COMPOSE_FILE_NAME);
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    file.write_all(DEFAULT_COMPOSE.as_bytes())?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

/// Path of the compose file inside `dir`.
pub fn compose_file(dir: &Path) -> PathBuf {
    dir.join(COMPOSE_FILE_NAME)
}

/// `docker` arguments for a compose subcommand against the file in `dir`,
/// e.g. `compose -f <dir>/localstack-docker-compose.yml up -d`.
pub fn compose_args(dir: &Path, subcommand: &[&str]) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        compose_file(dir).display().to_string(),
    ];
    args.extend(subcommand.iter().map(|s| s.to_string()));
    args
}

/// Remove the `.localstack` data directory under `dir`.
///
/// Returns `Ok(false)` when there was nothing to remove.
pub fn clean_data(dir: &Path) -> io::Result<bool> {
    let data = dir.join(DATA_DIR_NAME);
    if !data.is_dir() {
        tracing::debug!("no data directory at {}", data.display());
        return Ok(false);
    }
    tracing::info!("Deleting LocalStack data sub-directory: {}", data.display());
    fs::remove_dir_all(&data)?;
    Ok(true)
}
