//! Init and Config commands.

use std::path::Path;

use anyhow::Context;

use crate::config::{ConfigError, Settings};

/// Run init command - create configuration file under `root`.
pub fn run_init(root: &Path, force: bool) -> anyhow::Result<()> {
    match Settings::init_config_file(root, force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            Ok(())
        }
        Err(ConfigError::AlreadyExists(path)) => {
            eprintln!("Use --force to overwrite");
            anyhow::bail!("Configuration file already exists at: {}", path.display())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> anyhow::Result<()> {
    let rendered = config.to_toml().context("failed to render settings")?;
    println!("{rendered}");
    Ok(())
}
