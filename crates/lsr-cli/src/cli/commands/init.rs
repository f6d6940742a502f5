//! `lsr init` – write the default LocalStack docker-compose file.

use anyhow::{Context, Result};
use lsr_core::compose;
use lsr_core::config::LsrConfig;
use std::path::Path;

pub fn run_init(cfg: &LsrConfig, dir: Option<&Path>) -> Result<()> {
    let target = super::lifecycle::stack_dir(cfg, dir)?;
    tracing::info!("Initializing LocalStack");

    let path = compose::init_compose(&target)
        .with_context(|| format!("unable to initialize LocalStack in {}", target.display()))?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let cfg = LsrConfig::default();
        run_init(&cfg, Some(dir.path())).unwrap();
        let err = run_init(&cfg, Some(dir.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("unable to initialize LocalStack"));
    }

    #[test]
    fn target_under_a_regular_file_fails_at_once() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let start = std::time::Instant::now();
        let err = run_init(&LsrConfig::default(), Some(&file.join("sub"))).unwrap_err();
        assert!(format!("{:#}", err).contains("unable to initialize LocalStack"));
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }
}
