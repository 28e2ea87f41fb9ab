use crate::config::{load_global_settings, load_settings_from, ConfigError, Settings};
use crate::orchestration::{EngineError, RunEngine};
use crate::results::ResultsError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Options accepted before or after the command verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub config_path: Option<PathBuf>,
}

/// Pulls `--config <path>` out of `args`, returning the remaining words.
pub fn split_global_options(args: Vec<String>) -> Result<(GlobalOptions, Vec<String>), String> {
    let mut options = GlobalOptions::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter
                .next()
                .ok_or_else(|| "--config requires a path".to_string())?;
            options.config_path = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            options.config_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }
    Ok((options, rest))
}

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn load_settings(options: &GlobalOptions) -> Result<Settings, String> {
    match options.config_path.as_deref() {
        Some(path) => load_settings_from(path),
        None => load_global_settings(),
    }
    .map_err(map_config_err)
}

pub fn build_engine(options: &GlobalOptions) -> Result<RunEngine, String> {
    let settings = load_settings(options)?;
    RunEngine::from_settings(settings).map_err(|e| e.to_string())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode output: {e}"))
}

/// A failed command as printed by the console: `{"error": kind, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandFailure {
    #[serde(rename = "error")]
    pub kind: String,
    pub message: String,
}

impl CommandFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new("usage", message)
    }
}

impl From<EngineError> for CommandFailure {
    fn from(err: EngineError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<ResultsError> for CommandFailure {
    fn from(err: ResultsError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Writes archive bytes, creating parent directories.
pub fn write_output_file(path: &Path, bytes: &[u8]) -> Result<(), String> {
    crate::shared::fs_atomic::atomic_write_file(path, bytes)
        .map_err(|e| format!("failed to write {}: {e}", path.display()))
}
