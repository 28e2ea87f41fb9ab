use super::registry::{RunRecord, RunRegistry, RunStatus};
use crate::container::{ContainerError, ContainerId, ContainerRuntime};

/// Re-reads worker status for every non-terminal record accepted by
/// `select`, mirrors it into the registry, and completes `started` or
/// `running` records whose worker is gone or no longer running.
/// Runtime errors other than a missing container leave the record as is.
pub fn refresh_active_runs<F>(registry: &RunRegistry, runtime: &dyn ContainerRuntime, select: F)
where
    F: Fn(&RunRecord) -> bool,
{
    for record in registry.list() {
        if record.status.is_terminal() || !select(&record) {
            continue;
        }
        let id = ContainerId::new(record.container_id.clone());
        let (worker_status, running) = match runtime.inspect(&id) {
            Ok(info) => {
                let running = info.is_running();
                (info.status, running)
            }
            Err(ContainerError::NotFound { .. }) => ("removed".to_string(), false),
            Err(_) => continue,
        };
        let run_id = record.run_id.as_str();
        registry.set_worker_status(run_id, &worker_status);
        if !running && matches!(record.status, RunStatus::Started | RunStatus::Running) {
            // a concurrent stop may have moved it on already
            let _ = registry.transition(run_id, RunStatus::Completed);
        }
    }
}
