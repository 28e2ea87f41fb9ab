use super::admission::{admission_key, AdmissionController, AdmissionDecision, AdmissionLocks};
use super::descriptors::{ClearSummary, RunSummary, StartDescriptor, StopDescriptor};
use super::inventory::{cleanup_managed_containers, list_managed_containers, ContainerSummary};
use super::launcher::{LaunchRequest, Launcher};
use super::provision::{allocate_port, provision_results_volume};
use super::reaper::reap_stale_runs;
use super::refresh::refresh_active_runs;
use super::registry::RunRegistry;
use super::report_client::{HttpReportClient, WorkerReportClient};
use super::state_paths::{bootstrap_engine_paths, EnginePaths};
use super::terminator::Terminator;
use super::EngineError;
use crate::config::Settings;
use crate::container::{ContainerRuntime, DockerCli};
use crate::results::{archive_file_name, build_archive, ResultsError, ResultsStore};
use crate::shared::ids::{ProjectName, RunId, RunKey, ScenarioName};
use crate::shared::logging::append_engine_log;
use crate::shared::time::run_stamp;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};

/// Highest collision suffix tried before a start is refused.
const MAX_RUN_ID_SUFFIX: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartIntent {
    pub project: String,
    pub scenario: String,
    pub auth_token: String,
    pub interactive: bool,
}

impl StartIntent {
    pub fn new(project: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            scenario: scenario.into(),
            auth_token: String::new(),
            interactive: false,
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }
}

/// Owns the registry, admission locks and collaborators for one process.
pub struct RunEngine {
    settings: Settings,
    paths: EnginePaths,
    log_path: PathBuf,
    results: ResultsStore,
    registry: Arc<RunRegistry>,
    runtime: Arc<dyn ContainerRuntime>,
    reports: Arc<dyn WorkerReportClient>,
    locks: AdmissionLocks,
}

impl RunEngine {
    /// Rejects settings that fail validation before any directory is created.
    pub fn new(
        settings: Settings,
        runtime: Arc<dyn ContainerRuntime>,
        reports: Arc<dyn WorkerReportClient>,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let paths = EnginePaths::from_settings(&settings);
        bootstrap_engine_paths(&paths)?;
        Ok(Self {
            results: ResultsStore::new(paths.results_root()),
            log_path: paths.engine_log_path(),
            paths,
            settings,
            registry: Arc::new(RunRegistry::new()),
            runtime,
            reports,
            locks: AdmissionLocks::new(),
        })
    }

    /// Engine backed by the Docker CLI and an HTTP report client.
    pub fn from_settings(settings: Settings) -> Result<Self, EngineError> {
        let runtime = Arc::new(DockerCli::from_settings(&settings.container_runtime));
        Self::new(settings, runtime, Arc::new(HttpReportClient))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    fn log(&self, level: &str, event: &str, message: &str) {
        append_engine_log(&self.log_path, level, event, message);
    }

    fn admission(&self) -> AdmissionController<'_> {
        AdmissionController {
            registry: &self.registry,
            runtime: self.runtime.as_ref(),
            allow_parallel: self.settings.allow_parallel,
            log_path: &self.log_path,
        }
    }

    fn validate_intent(&self, intent: &StartIntent) -> Result<RunKey, EngineError> {
        let project = ProjectName::parse(&intent.project).map_err(EngineError::Validation)?;
        let scenario = ScenarioName::parse(&intent.scenario).map_err(EngineError::Validation)?;
        Ok(RunKey::new(project, scenario))
    }

    pub fn start_run(&self, intent: &StartIntent) -> Result<StartDescriptor, EngineError> {
        let key = self.validate_intent(intent)?;
        let (project, scenario) = self.settings.resolve_scenario(&key.project, &key.scenario)?;

        if self.registry.is_empty() {
            // re-checked under the gate; a launch may have landed meanwhile
            self.locks
                .exclusive(|| self.admission().cold_start_cleanup())?;
        }

        let _gate = self.locks.shared_gate();
        let key_lock = self
            .locks
            .key_lock(&admission_key(&key, self.settings.allow_parallel));
        let _admitted = key_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let AdmissionDecision::Existing(record) = self.admission().decide(&key)? {
            return Ok(StartDescriptor::folded(&record));
        }

        let now = Utc::now();
        let run_id = self.next_run_id(&key, now)?;
        let host_port = allocate_port(
            &self.settings.ports,
            self.settings.allow_parallel,
            &self.registry.active_ports(),
        )?;
        let results_mount = provision_results_volume(&self.paths, &key, &run_id)?;

        let launcher = Launcher {
            settings: &self.settings,
            paths: &self.paths,
            runtime: self.runtime.as_ref(),
            registry: &self.registry,
        };
        let results_dir = results_mount.host_path.clone();
        let launched = launcher.launch(LaunchRequest {
            key: &key,
            run_id: &run_id,
            project,
            scenario,
            interactive: intent.interactive,
            auth_token: &intent.auth_token,
            host_port,
            results_mount,
            started_at: now,
        });
        match launched {
            Ok(record) => Ok(StartDescriptor::started(&record)),
            Err(err) => {
                // only succeeds while the worker left nothing behind
                let _ = fs::remove_dir(&results_dir);
                Err(err)
            }
        }
    }

    /// `<key>-<stamp>`, or with a two-digit suffix when that id is already
    /// registered or has a results directory.
    fn next_run_id(&self, key: &RunKey, now: DateTime<Utc>) -> Result<RunId, EngineError> {
        let stamp = run_stamp(now);
        let taken = |id: &RunId| {
            self.registry.contains(id.as_str()) || self.paths.run_results_dir(key, id).exists()
        };
        let base = RunId::compose(key, &stamp);
        if !taken(&base) {
            return Ok(base);
        }
        (1..=MAX_RUN_ID_SUFFIX)
            .map(|suffix| RunId::compose(key, &format!("{stamp}{suffix:02}")))
            .find(|id| !taken(id))
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "too many runs of `{key}` started within one second"
                ))
            })
    }

    pub fn stop_run(&self, run_id: &str) -> StopDescriptor {
        Terminator {
            settings: &self.settings,
            paths: &self.paths,
            registry: &self.registry,
            runtime: self.runtime.as_ref(),
            reports: self.reports.as_ref(),
        }
        .stop(run_id)
    }

    pub fn reap_stale_at(&self, now: DateTime<Utc>) -> usize {
        let removed = reap_stale_runs(&self.registry, self.settings.stale_run_ttl(), now);
        if removed > 0 {
            self.log(
                "info",
                "reaper.removed",
                &format!("removed {removed} stale run record(s)"),
            );
        }
        removed
    }

    /// Reaps, refreshes worker status, then lists runs most recent first.
    pub fn list_active(&self) -> Vec<RunSummary> {
        self.list_active_at(Utc::now())
    }

    pub fn list_active_at(&self, now: DateTime<Utc>) -> Vec<RunSummary> {
        self.reap_stale_at(now);
        refresh_active_runs(&self.registry, self.runtime.as_ref(), |_| true);
        self.registry
            .list()
            .iter()
            .rev()
            .map(RunSummary::from)
            .collect()
    }

    pub fn list_completed(&self) -> Result<Vec<String>, ResultsError> {
        self.results.completed_runs()
    }

    pub fn report_html(&self, run_id: &str) -> Result<String, ResultsError> {
        self.results.read_report(run_id)
    }

    /// Archive bytes with their download file name.
    pub fn archive(&self, run_id: &str) -> Result<(String, Vec<u8>), ResultsError> {
        let bytes = build_archive(&self.results, run_id)?;
        Ok((archive_file_name(run_id), bytes))
    }

    pub fn list_containers(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        Ok(list_managed_containers(self.runtime.as_ref())?)
    }

    /// Forgets every run and purges every managed worker container.
    pub fn clear_all(&self) -> Result<ClearSummary, EngineError> {
        let summary = self.locks.exclusive(|| {
            let active_runs_cleared = self.registry.clear();
            let containers_cleared =
                cleanup_managed_containers(self.runtime.as_ref(), &self.log_path)?;
            Ok::<_, EngineError>(ClearSummary {
                active_runs_cleared,
                containers_cleared,
            })
        })?;
        self.log(
            "info",
            "clear_all",
            &format!(
                "active_runs_cleared={} containers_cleared={}",
                summary.active_runs_cleared, summary.containers_cleared
            ),
        );
        Ok(summary)
    }
}
