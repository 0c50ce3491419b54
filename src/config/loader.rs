// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::config::model::Settings;

/// Load settings from a given path.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config file at {path:?}"))?;

    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parsing TOML config from {path:?}"))?;

    validate_settings(&settings)?;
    Ok(settings)
}

/// Load settings from `path` if the file exists, otherwise fall back to the
/// built-in defaults.
///
/// This is the entry point used by the CLI: a `Cmsbatch.toml` is optional
/// and most installations run entirely on defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if path.is_file() {
        load_from_path(path)
    } else {
        debug!("no config file at {path:?}, using defaults");
        Ok(Settings::default())
    }
}

/// Basic sanity checks on loaded settings.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    let mgm = settings.storage.default_mgm.trim();
    if mgm.is_empty() {
        return Err(anyhow!("[storage].default_mgm must not be empty"));
    }
    if !mgm.starts_with("root://") {
        return Err(anyhow!(
            "[storage].default_mgm must start with 'root://' (got '{mgm}')"
        ));
    }
    Ok(())
}
