use super::EngineError;
use crate::shared::ids::{RunId, RunKey};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Running,
    Stopping,
    Stopped,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (RunStatus::Started, RunStatus::Running)
                | (RunStatus::Started, RunStatus::Stopping)
                | (RunStatus::Started, RunStatus::Completed)
                | (RunStatus::Started, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Stopping)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
                | (RunStatus::Stopping, RunStatus::Stopped)
                | (RunStatus::Stopping, RunStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Stopped | RunStatus::Completed | RunStatus::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Started => "started",
            RunStatus::Running => "running",
            RunStatus::Stopping => "stopping",
            RunStatus::Stopped => "stopped",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub status: RunStatus,
    pub project: String,
    pub scenario: String,
    pub interactive: bool,
    pub worker_url: String,
    pub host_port: u16,
    pub container_id: String,
    pub worker_status: String,
    pub started_at: String,
}

/// In-memory table of live and recently finished runs, in insertion order.
/// Every read hands out a copy; callers re-read instead of caching records.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: Mutex<Vec<RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Vec<RunRecord>> {
        self.runs.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn list(&self) -> Vec<RunRecord> {
        self.table().clone()
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.table()
            .iter()
            .find(|run| run.run_id.as_str() == run_id)
            .cloned()
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.table().iter().any(|run| run.run_id.as_str() == run_id)
    }

    pub fn add(&self, record: RunRecord) -> Result<(), EngineError> {
        let mut table = self.table();
        if table.iter().any(|run| run.run_id == record.run_id) {
            return Err(EngineError::Validation(format!(
                "run `{}` is already registered",
                record.run_id
            )));
        }
        table.push(record);
        Ok(())
    }

    pub fn remove(&self, run_id: &str) -> bool {
        let mut table = self.table();
        let before = table.len();
        table.retain(|run| run.run_id.as_str() != run_id);
        table.len() != before
    }

    pub fn clear(&self) -> usize {
        let mut table = self.table();
        let removed = table.len();
        table.clear();
        removed
    }

    /// Drops every record for which `keep` returns false; returns how many went.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&RunRecord) -> bool,
    {
        let mut table = self.table();
        let before = table.len();
        table.retain(|run| keep(run));
        before - table.len()
    }

    pub fn first_active(&self) -> Option<RunRecord> {
        self.table()
            .iter()
            .find(|run| !run.status.is_terminal())
            .cloned()
    }

    pub fn active_for_key(&self, key: &RunKey) -> Option<RunRecord> {
        self.table()
            .iter()
            .find(|run| !run.status.is_terminal() && run.run_id.has_key(key))
            .cloned()
    }

    /// Host ports held by runs that have not reached a terminal status.
    pub fn active_ports(&self) -> Vec<u16> {
        self.table()
            .iter()
            .filter(|run| !run.status.is_terminal())
            .map(|run| run.host_port)
            .collect()
    }

    pub fn transition(&self, run_id: &str, next: RunStatus) -> Result<RunRecord, EngineError> {
        let mut table = self.table();
        let run = table
            .iter_mut()
            .find(|run| run.run_id.as_str() == run_id)
            .ok_or_else(|| EngineError::NotFound {
                run_id: run_id.to_string(),
            })?;
        if !run.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                run_id: run_id.to_string(),
                from: run.status,
                to: next,
            });
        }
        run.status = next;
        Ok(run.clone())
    }

    pub fn set_worker_status(&self, run_id: &str, worker_status: &str) -> bool {
        let mut table = self.table();
        match table.iter_mut().find(|run| run.run_id.as_str() == run_id) {
            Some(run) => {
                run.worker_status = worker_status.to_string();
                true
            }
            None => false,
        }
    }
}
