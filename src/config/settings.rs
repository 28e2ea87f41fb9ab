use super::{ConfigError, ProjectSpec, ScenarioSpec};
use crate::shared::ids::{ProjectName, ScenarioName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub allow_parallel: bool,
    #[serde(default = "default_stale_run_ttl_seconds")]
    pub stale_run_ttl_seconds: u64,
    #[serde(default = "default_public_host")]
    pub public_host: String,
    #[serde(default)]
    pub ports: PortSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub container_runtime: ContainerRuntimeSettings,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortSettings {
    #[serde(default = "default_fixed_port")]
    pub fixed: u16,
    #[serde(default = "default_min_port")]
    pub min: u16,
    #[serde(default = "default_max_port")]
    pub max: u16,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            fixed: default_fixed_port(),
            min: default_min_port(),
            max: default_max_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    #[serde(default = "default_tmp_root")]
    pub tmp_root: PathBuf,
    #[serde(default = "default_scenarios_root")]
    pub scenarios_root: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            tmp_root: default_tmp_root(),
            scenarios_root: default_scenarios_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerSettings {
    #[serde(default = "default_worker_image")]
    pub image: String,
    #[serde(default = "default_worker_web_port")]
    pub web_port: u16,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_shape_runner")]
    pub shape_runner: String,
    #[serde(default = "default_report_timeout_seconds")]
    pub report_timeout_seconds: u64,
    #[serde(default = "default_stop_grace_seconds")]
    pub stop_grace_seconds: u64,
    #[serde(default = "default_log_excerpt_bytes")]
    pub log_excerpt_bytes: usize,
}

impl WorkerSettings {
    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_seconds)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_seconds)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            image: default_worker_image(),
            web_port: default_worker_web_port(),
            debug: false,
            shape_runner: default_shape_runner(),
            report_timeout_seconds: default_report_timeout_seconds(),
            stop_grace_seconds: default_stop_grace_seconds(),
            log_excerpt_bytes: default_log_excerpt_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContainerRuntimeSettings {
    #[serde(default = "default_runtime_binary")]
    pub binary: String,
    #[serde(default)]
    pub docker_host: Option<String>,
    #[serde(default = "default_command_timeout_seconds")]
    pub command_timeout_seconds: u64,
}

impl ContainerRuntimeSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }
}

impl Default for ContainerRuntimeSettings {
    fn default() -> Self {
        Self {
            binary: default_runtime_binary(),
            docker_host: None,
            command_timeout_seconds: default_command_timeout_seconds(),
        }
    }
}

fn default_stale_run_ttl_seconds() -> u64 {
    60
}

fn default_public_host() -> String {
    "http://localhost".to_string()
}

fn default_fixed_port() -> u16 {
    8080
}

fn default_min_port() -> u16 {
    8080
}

fn default_max_port() -> u16 {
    8090
}

fn default_tmp_root() -> PathBuf {
    PathBuf::from("./tmp")
}

fn default_scenarios_root() -> PathBuf {
    PathBuf::from("./scenarios")
}

fn default_worker_image() -> String {
    "locustio/locust:latest".to_string()
}

fn default_worker_web_port() -> u16 {
    8089
}

fn default_shape_runner() -> String {
    "/tests/common/staged_shape.py".to_string()
}

fn default_report_timeout_seconds() -> u64 {
    10
}

fn default_stop_grace_seconds() -> u64 {
    10
}

fn default_log_excerpt_bytes() -> usize {
    500
}

fn default_runtime_binary() -> String {
    "docker".to_string()
}

fn default_command_timeout_seconds() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_parallel: false,
            stale_run_ttl_seconds: default_stale_run_ttl_seconds(),
            public_host: default_public_host(),
            ports: PortSettings::default(),
            paths: PathSettings::default(),
            worker: WorkerSettings::default(),
            container_runtime: ContainerRuntimeSettings::default(),
            projects: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn stale_run_ttl(&self) -> Duration {
        Duration::from_secs(self.stale_run_ttl_seconds)
    }

    /// Applies `LOADRUN_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(raw) = std::env::var("LOADRUN_ALLOW_PARALLEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.allow_parallel = parse_env_bool("LOADRUN_ALLOW_PARALLEL", &raw)?;
        }
        if let Some(host) = std::env::var("LOADRUN_DOCKER_HOST")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.container_runtime.docker_host = Some(host);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ports.min > self.ports.max {
            return Err(ConfigError::Settings(format!(
                "ports.min ({}) must not exceed ports.max ({})",
                self.ports.min, self.ports.max
            )));
        }
        if self.worker.image.trim().is_empty() {
            return Err(ConfigError::Settings(
                "worker.image must be non-empty".to_string(),
            ));
        }
        if self.container_runtime.binary.trim().is_empty() {
            return Err(ConfigError::Settings(
                "container_runtime.binary must be non-empty".to_string(),
            ));
        }
        for (project_key, project) in &self.projects {
            ProjectName::parse(project_key).map_err(ConfigError::Settings)?;
            for (scenario_key, scenario) in &project.scenarios {
                ScenarioName::parse(scenario_key).map_err(ConfigError::Settings)?;
                scenario.validate().map_err(|reason| {
                    ConfigError::Settings(format!(
                        "scenario `{project_key}/{scenario_key}`: {reason}"
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn resolve_project(&self, project: &ProjectName) -> Result<&ProjectSpec, ConfigError> {
        self.projects
            .get(project.as_str())
            .ok_or_else(|| ConfigError::UnknownProject {
                project: project.to_string(),
            })
    }

    pub fn resolve_scenario(
        &self,
        project: &ProjectName,
        scenario: &ScenarioName,
    ) -> Result<(&ProjectSpec, &ScenarioSpec), ConfigError> {
        let spec = self.resolve_project(project)?;
        let scenario_spec =
            spec.scenarios
                .get(scenario.as_str())
                .ok_or_else(|| ConfigError::UnknownScenario {
                    project: project.to_string(),
                    scenario: scenario.to_string(),
                })?;
        Ok((spec, scenario_spec))
    }
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Settings(format!(
            "{name} must be a boolean, got `{other}`"
        ))),
    }
}
