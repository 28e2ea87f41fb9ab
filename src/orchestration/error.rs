use crate::config::ConfigError;
use crate::container::ContainerError;
use crate::orchestration::registry::RunStatus;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid start request: {0}")]
    Validation(String),
    #[error("run `{run_id}` not found")]
    NotFound { run_id: String },
    #[error("container runtime unavailable: {0}")]
    Runtime(#[from] ContainerError),
    #[error("worker for run `{run_id}` failed to start (status `{status}`): {logs}")]
    LaunchFailure {
        run_id: String,
        status: String,
        logs: String,
    },
    #[error("a worker is already running and no active run describes it")]
    WorkerSlotBusy,
    #[error("run `{run_id}` cannot move from `{from}` to `{to}`")]
    InvalidTransition {
        run_id: String,
        from: RunStatus,
        to: RunStatus,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Stable machine-readable label used in console output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Runtime(_) => "runtime_unavailable",
            Self::LaunchFailure { .. } => "launch_failure",
            Self::WorkerSlotBusy => "worker_slot_busy",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Io { .. } | Self::Json { .. } => "internal",
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Validation(value.to_string())
    }
}

pub(crate) fn io_error(path: &std::path::Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn json_error(path: &std::path::Path, source: serde_json::Error) -> EngineError {
    EngineError::Json {
        path: path.display().to_string(),
        source,
    }
}
