use super::load_shape::LoadShape;
use super::registry::{RunRecord, RunRegistry, RunStatus};
use super::state_paths::{
    absolute_path, worker_results_dir, worker_shape_file, EnginePaths, WORKER_SCENARIOS_DIR,
};
use super::EngineError;
use crate::config::{ProjectSpec, ScenarioSpec, Settings};
use crate::container::{
    ContainerId, ContainerRuntime, ContainerSpec, PortBinding, VolumeMount, MANAGED_LABEL,
    PROJECT_LABEL, RUN_ID_LABEL, SCENARIO_LABEL,
};
use crate::results::catalog::REPORT_FILE_NAME;
use crate::shared::ids::{RunId, RunKey};
use crate::shared::logging::append_engine_log;
use crate::shared::time::iso_timestamp;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

pub const CONTAINER_NAME_PREFIX: &str = "loadrun_";
pub const LOAD_SHAPE_ENV: &str = "LOAD_SHAPE_FILE";

/// An admitted start, with its resources already provisioned.
#[derive(Debug, Clone)]
pub struct LaunchRequest<'a> {
    pub key: &'a RunKey,
    pub run_id: &'a RunId,
    pub project: &'a ProjectSpec,
    pub scenario: &'a ScenarioSpec,
    pub interactive: bool,
    pub auth_token: &'a str,
    pub host_port: u16,
    pub results_mount: VolumeMount,
    pub started_at: DateTime<Utc>,
}

pub struct Launcher<'a> {
    pub settings: &'a Settings,
    pub paths: &'a EnginePaths,
    pub runtime: &'a dyn ContainerRuntime,
    pub registry: &'a RunRegistry,
}

/// Worker command line. Only parametric scenarios pass user, spawn-rate and
/// run-time flags; staged ones are driven by the load-shape file.
pub fn worker_command(
    settings: &Settings,
    key: &RunKey,
    run_id: &RunId,
    project: &ProjectSpec,
    scenario: &ScenarioSpec,
    interactive: bool,
) -> Vec<String> {
    let results = worker_results_dir(key, run_id);
    let mut sources = format!(
        "{WORKER_SCENARIOS_DIR}/{}/{}.py",
        key.project, key.scenario
    );
    if let ScenarioSpec::Staged(_) = scenario {
        sources.push(',');
        sources.push_str(&settings.worker.shape_runner);
    }

    let mut args = vec!["-f".to_string(), sources];
    if settings.worker.debug {
        args.extend(["--loglevel".to_string(), "DEBUG".to_string()]);
    }
    args.extend([
        "--host".to_string(),
        project.host.clone(),
        "--web-port".to_string(),
        settings.worker.web_port.to_string(),
        "--html".to_string(),
        format!("{results}/{REPORT_FILE_NAME}"),
        "--csv".to_string(),
        format!("{results}/stats"),
        "--csv-full-history".to_string(),
    ]);
    if !interactive {
        args.push("--headless".to_string());
    }
    match scenario {
        ScenarioSpec::Parametric(spec) => args.extend([
            "--users".to_string(),
            spec.users.to_string(),
            "--spawn-rate".to_string(),
            spec.spawn_rate.to_string(),
            "--run-time".to_string(),
            spec.run_time.to_string(),
        ]),
        ScenarioSpec::Staged(_) => {}
    }
    args
}

impl Launcher<'_> {
    fn log(&self, level: &str, event: &str, message: &str) {
        append_engine_log(&self.paths.engine_log_path(), level, event, message);
    }

    /// Writes the staged load shape and returns its read-only mount.
    fn materialize_shape(
        &self,
        request: &LaunchRequest<'_>,
    ) -> Result<Option<(VolumeMount, String)>, EngineError> {
        let ScenarioSpec::Staged(staged) = request.scenario else {
            return Ok(None);
        };
        let key = request.key;
        let shape = LoadShape::from_staged(&key.project, &key.scenario, staged);
        let host_path = self.paths.shape_file(&key.project, &key.scenario);
        shape.write_to(&host_path)?;
        let worker_path = worker_shape_file(&key.project, &key.scenario);
        Ok(Some((
            VolumeMount::read_only(absolute_path(&host_path)?, worker_path.clone()),
            worker_path,
        )))
    }

    pub fn container_spec(&self, request: &LaunchRequest<'_>) -> Result<ContainerSpec, EngineError> {
        let scenarios = absolute_path(&self.paths.scenarios_root)?;
        let mut volumes = vec![
            VolumeMount::read_only(scenarios, WORKER_SCENARIOS_DIR),
            request.results_mount.clone(),
        ];

        let mut env = BTreeMap::from([
            ("AUTH_TOKEN".to_string(), request.auth_token.to_string()),
            ("PYTHONPATH".to_string(), format!("{WORKER_SCENARIOS_DIR}/")),
        ]);
        if let Some((mount, worker_path)) = self.materialize_shape(request)? {
            volumes.push(mount);
            env.insert(LOAD_SHAPE_ENV.to_string(), worker_path);
        }

        let labels = BTreeMap::from([
            (MANAGED_LABEL.to_string(), "true".to_string()),
            (RUN_ID_LABEL.to_string(), request.run_id.to_string()),
            (PROJECT_LABEL.to_string(), request.key.project.to_string()),
            (SCENARIO_LABEL.to_string(), request.key.scenario.to_string()),
        ]);

        Ok(ContainerSpec {
            name: format!("{CONTAINER_NAME_PREFIX}{}", request.run_id),
            image: self.settings.worker.image.clone(),
            command: worker_command(
                self.settings,
                request.key,
                request.run_id,
                request.project,
                request.scenario,
                request.interactive,
            ),
            volumes,
            ports: vec![PortBinding {
                host_port: request.host_port,
                container_port: self.settings.worker.web_port,
            }],
            env,
            labels,
        })
    }

    /// Starts the worker, confirms it is running and registers the run.
    /// A worker that is not running right after start is stopped and
    /// removed before the failure is returned.
    pub fn launch(&self, request: LaunchRequest<'_>) -> Result<RunRecord, EngineError> {
        let spec = self.container_spec(&request)?;
        let run_id = request.run_id.to_string();

        let container_id = match self.runtime.run(&spec) {
            Ok(id) => id,
            Err(err) => {
                let _ = self.runtime.remove(&ContainerId::new(spec.name.clone()), true);
                self.log("error", "launch.failed", &format!("run_id={run_id} {err}"));
                return Err(err.into());
            }
        };

        let info = match self.runtime.inspect(&container_id) {
            Ok(info) => info,
            Err(err) => {
                self.discard(&container_id);
                self.log("error", "launch.failed", &format!("run_id={run_id} {err}"));
                return Err(err.into());
            }
        };

        if !info.is_running() {
            let logs = self
                .runtime
                .logs(&container_id, self.settings.worker.log_excerpt_bytes)
                .unwrap_or_else(|err| format!("<logs unavailable: {err}>"));
            self.discard(&container_id);
            self.log(
                "error",
                "launch.failed",
                &format!("run_id={run_id} status={} logs={logs}", info.status),
            );
            return Err(EngineError::LaunchFailure {
                run_id,
                status: info.status,
                logs,
            });
        }

        let host_port = info
            .host_port(self.settings.worker.web_port)
            .unwrap_or(request.host_port);
        let record = RunRecord {
            run_id: request.run_id.clone(),
            status: RunStatus::Running,
            project: request.key.project.to_string(),
            scenario: request.key.scenario.to_string(),
            interactive: request.interactive,
            worker_url: format!("{}:{host_port}", self.settings.public_host),
            host_port,
            container_id: container_id.to_string(),
            worker_status: info.status,
            started_at: iso_timestamp(request.started_at),
        };
        if let Err(err) = self.registry.add(record.clone()) {
            self.discard(&container_id);
            return Err(err);
        }
        self.log(
            "info",
            "launch.started",
            &format!(
                "run_id={run_id} container={} url={}",
                container_id.short(),
                record.worker_url
            ),
        );
        Ok(record)
    }

    fn discard(&self, id: &ContainerId) {
        if let Err(err) = self.runtime.stop(id, Duration::ZERO) {
            self.log(
                "warn",
                "launch.rollback",
                &format!("container={} stop failed: {err}", id.short()),
            );
        }
        if let Err(err) = self.runtime.remove(id, true) {
            self.log(
                "warn",
                "launch.rollback",
                &format!("container={} remove failed: {err}", id.short()),
            );
        }
    }
}
