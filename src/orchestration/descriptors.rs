use super::registry::RunRecord;
use serde::{Deserialize, Serialize};

pub const STATUS_STARTED: &str = "started";
pub const STATUS_RUNNING: &str = "running";
pub const STATUS_STOPPED: &str = "stopped";
pub const STATUS_ERR: &str = "err";
pub const STOP_SUCCESS_MESSAGE: &str = "Success";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDescriptor {
    pub run_id: String,
    pub interactive: bool,
    pub worker_url: String,
    pub status: String,
    pub worker_status: String,
}

impl StartDescriptor {
    pub fn started(record: &RunRecord) -> Self {
        Self::with_status(record, STATUS_STARTED)
    }

    /// Descriptor for a start folded into an already active run.
    pub fn folded(record: &RunRecord) -> Self {
        Self::with_status(record, STATUS_RUNNING)
    }

    fn with_status(record: &RunRecord, status: &str) -> Self {
        Self {
            run_id: record.run_id.to_string(),
            interactive: record.interactive,
            worker_url: record.worker_url.clone(),
            status: status.to_string(),
            worker_status: record.worker_status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDescriptor {
    pub run_id: String,
    pub status: String,
    pub worker_status: String,
    pub message: String,
}

impl StopDescriptor {
    pub fn stopped(run_id: &str, worker_status: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            status: STATUS_STOPPED.to_string(),
            worker_status: worker_status.to_string(),
            message: STOP_SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn unknown_run(run_id: &str) -> Self {
        Self {
            run_id: STATUS_ERR.to_string(),
            status: STATUS_ERR.to_string(),
            worker_status: STATUS_ERR.to_string(),
            message: format!("run `{run_id}` not found"),
        }
    }

    pub fn failed(run_id: &str, message: impl Into<String>) -> Self {
        Self {
            run_id: run_id.to_string(),
            status: STATUS_ERR.to_string(),
            worker_status: STATUS_ERR.to_string(),
            message: message.into(),
        }
    }

    pub fn is_err(&self) -> bool {
        self.status == STATUS_ERR
    }
}

/// Row of the active-runs listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub status: String,
    pub project: String,
    pub scenario: String,
    pub interactive: bool,
    pub worker_url: String,
    pub worker_status: String,
    pub started_at: String,
}

impl From<&RunRecord> for RunSummary {
    fn from(record: &RunRecord) -> Self {
        Self {
            run_id: record.run_id.to_string(),
            status: record.status.to_string(),
            project: record.project.clone(),
            scenario: record.scenario.clone(),
            interactive: record.interactive,
            worker_url: record.worker_url.clone(),
            worker_status: record.worker_status.clone(),
            started_at: record.started_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    pub active_runs_cleared: usize,
    pub containers_cleared: usize,
}
