use crate::container::{
    ContainerError, ContainerFilter, ContainerInfo, ContainerRuntime, RUN_ID_LABEL,
};
use crate::shared::logging::append_engine_log;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub image: String,
    pub run_id: Option<String>,
    /// `host:container` pairs
    pub ports: Vec<String>,
}

impl From<&ContainerInfo> for ContainerSummary {
    fn from(info: &ContainerInfo) -> Self {
        Self {
            id: info.container_id().short().to_string(),
            name: info.name.clone(),
            status: info.status.clone(),
            image: info.image.clone(),
            run_id: info.labels.get(RUN_ID_LABEL).cloned(),
            ports: info
                .ports
                .iter()
                .map(|(container, host)| format!("{host}:{container}"))
                .collect(),
        }
    }
}

pub fn count_running_workers(runtime: &dyn ContainerRuntime) -> Result<usize, ContainerError> {
    Ok(runtime.list(ContainerFilter::Running)?.len())
}

pub fn list_managed_containers(
    runtime: &dyn ContainerRuntime,
) -> Result<Vec<ContainerSummary>, ContainerError> {
    Ok(runtime
        .list(ContainerFilter::All)?
        .iter()
        .map(ContainerSummary::from)
        .collect())
}

/// Stops running managed workers, then removes every managed container.
/// Individual failures are logged and skipped; the count covers removals
/// that succeeded.
pub fn cleanup_managed_containers(
    runtime: &dyn ContainerRuntime,
    log_path: &Path,
) -> Result<usize, ContainerError> {
    let containers = runtime.list(ContainerFilter::All)?;
    let mut removed = 0;
    for info in &containers {
        let id = info.container_id();
        if info.is_running() {
            if let Err(err) = runtime.stop(&id, Duration::ZERO) {
                append_engine_log(
                    log_path,
                    "warn",
                    "container.cleanup_failed",
                    &format!("container={} stop failed: {err}", id.short()),
                );
            }
        }
        match runtime.remove(&id, true) {
            Ok(()) => removed += 1,
            Err(err) => append_engine_log(
                log_path,
                "warn",
                "container.cleanup_failed",
                &format!("container={} remove failed: {err}", id.short()),
            ),
        }
    }
    Ok(removed)
}
