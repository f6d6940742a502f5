use crate::retry::{RetryPolicy, DEFAULT_MAX_RETRIES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first). Must be at least 1.
    pub max_retries: u32,
    /// Backoff unit in milliseconds; the wait after failure n is `base * e^n`.
    pub base_delay_ms: u64,
    /// Jitter half-width in milliseconds.
    pub jitter_ms: u64,
    /// Optional cap on a single wait in milliseconds (unset = no cap).
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: 1000,
            jitter_ms: 1000,
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        if self.max_retries == 0 {
            anyhow::bail!("retry.max_retries must be at least 1");
        }
        Ok(RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            jitter: Duration::from_millis(self.jitter_ms),
            max_delay: self.max_delay_ms.map(Duration::from_millis),
        })
    }
}

/// Global configuration loaded from `~/.config/lsr/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsrConfig {
    /// LocalStack host.
    pub host: String,
    /// LocalStack edge port.
    pub port: u16,
    /// Region used to sign requests against LocalStack.
    pub signing_region: String,
    /// Directory holding the docker-compose file (default `./localstack`).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for LsrConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4566,
            signing_region: "us-east-1".to_string(),
            working_dir: None,
            retry: None,
        }
    }
}

impl LsrConfig {
    /// Effective retry policy: the `[retry]` section, or defaults.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        match &self.retry {
            Some(retry) => retry.to_policy(),
            None => Ok(RetryPolicy::default()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lsr")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LsrConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LsrConfig::default();
        write_config(&path, &default_cfg)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<LsrConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: LsrConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

pub fn write_config(path: &Path, cfg: &LsrConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_values() {
        let cfg = LsrConfig::default();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 4566);
        assert_eq!(cfg.signing_region, "us-east-1");
        assert!(cfg.working_dir.is_none());
        assert_eq!(cfg.retry_policy().unwrap(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = LsrConfig {
            retry: Some(RetryConfig::default()),
            ..LsrConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: LsrConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            host = "localstack"
            port = 4567
            signing_region = "eu-west-1"
            working_dir = "/srv/stack"

            [retry]
            max_retries = 3
            base_delay_ms = 200
            jitter_ms = 50
            max_delay_ms = 5000
        "#;
        let cfg: LsrConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.host, "localstack");
        assert_eq!(cfg.port, 4567);
        assert_eq!(cfg.working_dir.as_deref(), Some(Path::new("/srv/stack")));
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.jitter, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Some(Duration::from_secs(5)));
    }

    #[test]
    fn retry_section_without_cap_is_unclamped() {
        let toml = r#"
            host = "localhost"
            port = 4566
            signing_region = "us-east-1"

            [retry]
            max_retries = 4
            base_delay_ms = 1000
            jitter_ms = 1000
        "#;
        let cfg: LsrConfig = toml::from_str(toml).unwrap();
        assert!(cfg.retry_policy().unwrap().max_delay.is_none());
    }

    #[test]
    fn zero_max_retries_is_rejected() {
        let retry = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert!(retry.to_policy().is_err());
    }

    #[test]
    fn write_then_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = LsrConfig {
            port: 9999,
            ..LsrConfig::default()
        };
        write_config(&path, &cfg).unwrap();
        assert_eq!(load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn load_from_missing_path_mentions_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }
}
