//! System configuration loading.
//!
//! Layers, lowest first:
//! 1. [`SystemConfig::default`]
//! 2. an optional TOML file (path from `KITSHEET_CONFIG`)
//! 3. `KITSHEET_*` environment variables, `__` separating nested keys
//!    (`KITSHEET_MAX_TRACKERS=6`, `KITSHEET_COLORS__RED=#aa0000`)
//!
//! Colour slots and labels missing after the merge are filled back in
//! from the defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use kitsheet_domain::SystemConfig;

pub const CONFIG_PATH_VAR: &str = "KITSHEET_CONFIG";
const ENV_PREFIX: &str = "KITSHEET";

/// Path named by `KITSHEET_CONFIG`, if set and non-blank.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_VAR)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

pub fn load_system_config(path: Option<&Path>) -> anyhow::Result<SystemConfig> {
    build(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build(path: Option<&Path>, env: Environment) -> anyhow::Result<SystemConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let config: SystemConfig = builder
        .add_source(env)
        .build()
        .context("Failed to read system configuration")?
        .try_deserialize()
        .context("Invalid system configuration")?;

    let config = config.normalized();
    tracing::info!(
        file = ?path,
        colors = config.colors.len(),
        max_trackers = config.max_trackers,
        default_categories = ?config.default_categories,
        "Loaded system configuration"
    );
    Ok(config)
}
