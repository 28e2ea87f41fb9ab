use super::{default_global_config_path, ConfigError, Settings};
use crate::shared::fs_atomic::atomic_write_file;
use std::path::{Path, PathBuf};

/// Validates `settings` and atomically replaces the file at `path`.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    settings.validate()?;
    let body = serde_yaml::to_string(settings).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(path, body.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = default_global_config_path()?;
    save_settings_to(&path, settings)?;
    Ok(path)
}
