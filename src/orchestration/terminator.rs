use super::descriptors::StopDescriptor;
use super::registry::{RunRecord, RunRegistry, RunStatus};
use super::report_client::WorkerReportClient;
use super::state_paths::EnginePaths;
use super::EngineError;
use crate::config::Settings;
use crate::container::{ContainerId, ContainerRuntime};
use crate::results::catalog::REPORT_FILE_NAME;
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::logging::append_engine_log;

pub const STOP_IN_PROGRESS_MESSAGE: &str = "stop already in progress";

pub struct Terminator<'a> {
    pub settings: &'a Settings,
    pub paths: &'a EnginePaths,
    pub registry: &'a RunRegistry,
    pub runtime: &'a dyn ContainerRuntime,
    pub reports: &'a dyn WorkerReportClient,
}

impl Terminator<'_> {
    fn log(&self, level: &str, event: &str, message: &str) {
        append_engine_log(&self.paths.engine_log_path(), level, event, message);
    }

    /// Stops a run's worker. Failures come back as an `err` descriptor;
    /// report harvesting problems are only logged.
    pub fn stop(&self, run_id: &str) -> StopDescriptor {
        let Some(record) = self.registry.get(run_id) else {
            return StopDescriptor::unknown_run(run_id);
        };

        let transitioned = match record.status {
            RunStatus::Stopping => {
                return StopDescriptor::failed(run_id, STOP_IN_PROGRESS_MESSAGE);
            }
            status if status.is_terminal() => false,
            _ => match self.registry.transition(run_id, RunStatus::Stopping) {
                Ok(_) => true,
                // lost a race with another stop or the reaper
                Err(EngineError::InvalidTransition { .. }) => {
                    return StopDescriptor::failed(run_id, STOP_IN_PROGRESS_MESSAGE);
                }
                Err(_) => return StopDescriptor::unknown_run(run_id),
            },
        };

        if record.interactive {
            self.harvest_report(&record);
        }

        match self.stop_worker(&record) {
            Ok(worker_status) => {
                self.registry.set_worker_status(run_id, &worker_status);
                if transitioned {
                    let _ = self.registry.transition(run_id, RunStatus::Stopped);
                }
                StopDescriptor::stopped(run_id, &worker_status)
            }
            Err(err) => {
                self.log("error", "stop.failed", &format!("run_id={run_id} {err}"));
                if transitioned {
                    let _ = self.registry.transition(run_id, RunStatus::Failed);
                }
                StopDescriptor::failed(run_id, format!("Failed: {err}"))
            }
        }
    }

    fn stop_worker(&self, record: &RunRecord) -> Result<String, EngineError> {
        let id = ContainerId::new(record.container_id.clone());
        self.runtime.stop(&id, self.settings.worker.stop_grace())?;
        Ok(self.runtime.inspect(&id)?.status)
    }

    fn harvest_report(&self, record: &RunRecord) {
        let run_id = &record.run_id;
        let key = match run_id.key() {
            Ok(key) => key,
            Err(err) => {
                self.log("warn", "stop.report_failed", &format!("run_id={run_id} {err}"));
                return;
            }
        };
        let body = match self
            .reports
            .fetch_report(&record.worker_url, self.settings.worker.report_timeout())
        {
            Ok(body) => body,
            Err(err) => {
                self.log("warn", "stop.report_failed", &format!("run_id={run_id} {err}"));
                return;
            }
        };
        let path = self
            .paths
            .run_results_dir(&key, run_id)
            .join(REPORT_FILE_NAME);
        match atomic_write_file(&path, body.as_bytes()) {
            Ok(()) => self.log(
                "info",
                "stop.report_saved",
                &format!("run_id={run_id} path={}", path.display()),
            ),
            Err(err) => self.log(
                "warn",
                "stop.report_failed",
                &format!("run_id={run_id} path={} {err}", path.display()),
            ),
        }
    }
}
