use super::inventory::{cleanup_managed_containers, count_running_workers};
use super::refresh::refresh_active_runs;
use super::registry::{RunRecord, RunRegistry};
use super::EngineError;
use crate::container::ContainerRuntime;
use crate::shared::ids::RunKey;
use crate::shared::logging::append_engine_log;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

/// Admission key used for every start while parallel runs are disabled.
pub const GLOBAL_ADMISSION_KEY: &str = "*";

pub fn admission_key(key: &RunKey, allow_parallel: bool) -> String {
    if allow_parallel {
        key.prefix()
    } else {
        GLOBAL_ADMISSION_KEY.to_string()
    }
}

/// Serializes admission plus launch per key. Cold-start cleanup takes the
/// gate exclusively so it never races a launch in flight.
#[derive(Debug, Default)]
pub struct AdmissionLocks {
    gate: RwLock<()>,
    keys: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AdmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut keys = self.keys.lock().unwrap_or_else(|err| err.into_inner());
        keys.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn shared_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(|err| err.into_inner())
    }

    /// Runs `f` with no admission in flight.
    pub fn exclusive<T>(&self, f: impl FnOnce() -> T) -> T {
        let _gate = self.gate.write().unwrap_or_else(|err| err.into_inner());
        f()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Fold the request into this active run.
    Existing(RunRecord),
    Admit,
}

pub struct AdmissionController<'a> {
    pub registry: &'a RunRegistry,
    pub runtime: &'a dyn ContainerRuntime,
    pub allow_parallel: bool,
    pub log_path: &'a Path,
}

impl AdmissionController<'_> {
    /// With an empty registry any managed worker is left over from an
    /// earlier process and gets purged. Returns the number removed.
    pub fn cold_start_cleanup(&self) -> Result<usize, EngineError> {
        if !self.registry.is_empty() {
            return Ok(0);
        }
        let removed = cleanup_managed_containers(self.runtime, self.log_path)?;
        if removed > 0 {
            append_engine_log(
                self.log_path,
                "info",
                "admission.cleanup",
                &format!("removed {removed} leftover worker container(s)"),
            );
        }
        Ok(removed)
    }

    /// Caller must hold the key lock for `key`.
    pub fn decide(&self, key: &RunKey) -> Result<AdmissionDecision, EngineError> {
        if !self.allow_parallel && count_running_workers(self.runtime)? > 0 {
            // the first record may describe a worker that has since exited
            refresh_active_runs(self.registry, self.runtime, |_| true);
            return match self.registry.first_active() {
                Some(record) => Ok(self.fold(record)),
                None => Err(EngineError::WorkerSlotBusy),
            };
        }

        refresh_active_runs(self.registry, self.runtime, |record| {
            record.run_id.has_key(key)
        });
        Ok(match self.registry.active_for_key(key) {
            Some(record) => self.fold(record),
            None => AdmissionDecision::Admit,
        })
    }

    fn fold(&self, record: RunRecord) -> AdmissionDecision {
        append_engine_log(
            self.log_path,
            "info",
            "admission.folded",
            &format!("start folded into run_id={}", record.run_id),
        );
        AdmissionDecision::Existing(record)
    }
}
