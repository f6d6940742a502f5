//! `lsr show-config` – print where the config lives and what is in effect.

use anyhow::Result;
use lsr_core::config::{self, LsrConfig};
use lsr_core::endpoint::Endpoint;
use std::path::Path;

pub fn run_show_config(cfg: &LsrConfig, explicit_path: Option<&Path>) -> Result<()> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    println!("# endpoint: {}", Endpoint::from_config(cfg).url());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
