//! Contract the engine needs from a container runtime, plus the Docker CLI
//! backend that ships with the crate.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub mod docker_cli;
pub mod process;

pub use crate::shared::errors::ContainerError;
pub use docker_cli::DockerCli;

pub const MANAGED_LABEL: &str = "loadrun.managed";
pub const RUN_ID_LABEL: &str = "loadrun.run_id";
pub const PROJECT_LABEL: &str = "loadrun.project";
pub const SCENARIO_LABEL: &str = "loadrun.scenario";
pub const RUNNING_STATUS: &str = "running";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        process::truncate_utf8(&self.0, 12)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFilter {
    All,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: PathBuf,
    pub container_path: String,
    pub read_only: bool,
}

impl VolumeMount {
    pub fn read_only(host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
            read_only: true,
        }
    }

    pub fn read_write(host_path: impl Into<PathBuf>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub host_port: u16,
    pub container_port: u16,
}

/// Everything needed to start one detached worker container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub volumes: Vec<VolumeMount>,
    pub ports: Vec<PortBinding>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    /// container port -> host port
    pub ports: BTreeMap<u16, u16>,
}

impl ContainerInfo {
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new(self.id.clone())
    }

    pub fn is_running(&self) -> bool {
        self.status == RUNNING_STATUS
    }

    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        self.ports.get(&container_port).copied()
    }
}

/// Every call is bounded by a timeout chosen by the implementation. Listing
/// only ever returns containers carrying [`MANAGED_LABEL`].
pub trait ContainerRuntime: Send + Sync {
    fn list(&self, filter: ContainerFilter) -> Result<Vec<ContainerInfo>, ContainerError>;
    fn run(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;
    fn inspect(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;
    fn stop(&self, id: &ContainerId, grace: Duration) -> Result<(), ContainerError>;
    fn remove(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;
    fn logs(&self, id: &ContainerId, max_bytes: usize) -> Result<String, ContainerError>;
}
