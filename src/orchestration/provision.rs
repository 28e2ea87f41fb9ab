use super::error::io_error;
use super::state_paths::{absolute_path, worker_results_dir, EnginePaths};
use super::EngineError;
use crate::config::PortSettings;
use crate::container::VolumeMount;
use crate::shared::fs_atomic::create_world_writable_dir;
use crate::shared::ids::{RunId, RunKey};
use getrandom::getrandom;

/// Host port for a new worker. Without parallel runs every worker shares
/// the fixed port; otherwise a random port from the inclusive range,
/// preferring ones not held by an active run.
pub fn allocate_port(
    ports: &PortSettings,
    allow_parallel: bool,
    taken: &[u16],
) -> Result<u16, EngineError> {
    if !allow_parallel {
        return Ok(ports.fixed);
    }
    let mut bytes = [0_u8; 4];
    getrandom(&mut bytes).map_err(|err| {
        EngineError::Validation(format!("failed to draw a random worker port: {err}"))
    })?;
    Ok(choose_port(
        ports.min,
        ports.max,
        taken,
        u32::from_le_bytes(bytes),
    ))
}

pub fn choose_port(min: u16, max: u16, taken: &[u16], sample: u32) -> u16 {
    let free = (min..=max)
        .filter(|port| !taken.contains(port))
        .collect::<Vec<_>>();
    if free.is_empty() {
        let span = u32::from(max.saturating_sub(min)) + 1;
        return min + (sample % span) as u16;
    }
    free[(sample as usize) % free.len()]
}

/// Creates the run's results directory and returns its bind mount.
pub fn provision_results_volume(
    paths: &EnginePaths,
    key: &RunKey,
    run_id: &RunId,
) -> Result<VolumeMount, EngineError> {
    let dir = paths.run_results_dir(key, run_id);
    create_world_writable_dir(&dir).map_err(|source| io_error(&dir, source))?;
    Ok(VolumeMount::read_write(
        absolute_path(&dir)?,
        worker_results_dir(key, run_id),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ids::{ProjectName, ScenarioName};
    use tempfile::tempdir;

    #[test]
    fn fixed_port_is_used_without_parallel_runs() {
        let ports = PortSettings {
            fixed: 8080,
            min: 9000,
            max: 9010,
        };
        assert_eq!(allocate_port(&ports, false, &[8080]).expect("port"), 8080);
    }

    #[test]
    fn parallel_ports_stay_within_range() {
        let ports = PortSettings {
            fixed: 8080,
            min: 9000,
            max: 9002,
        };
        for _ in 0..20 {
            let port = allocate_port(&ports, true, &[]).expect("port");
            assert!((9000..=9002).contains(&port));
        }
    }

    #[test]
    fn choose_port_skips_ports_held_by_active_runs() {
        for sample in 0..10 {
            assert_eq!(choose_port(9000, 9002, &[9000, 9002], sample), 9001);
        }
        let exhausted = choose_port(9000, 9001, &[9000, 9001], 3);
        assert!((9000..=9001).contains(&exhausted));
        assert_eq!(choose_port(7000, 7000, &[], u32::MAX), 7000);
    }

    #[test]
    fn inverted_range_falls_back_to_the_lower_bound() {
        assert_eq!(choose_port(9010, 9000, &[], 5), 9010);
        assert_eq!(choose_port(9010, 9000, &[9010], u32::MAX), 9010);
    }

    #[cfg(unix)]
    #[test]
    fn results_volume_is_world_writable_and_bound_under_results() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let paths = EnginePaths::new(dir.path().join("tmp"), dir.path().join("scenarios"));
        let key = RunKey::new(
            ProjectName::parse("shop").expect("project"),
            ScenarioName::parse("stress").expect("scenario"),
        );
        let run_id = RunId::compose(&key, "20260101120000");

        let mount = provision_results_volume(&paths, &key, &run_id).expect("provision");
        assert!(!mount.read_only);
        assert_eq!(
            mount.container_path,
            "/results/shop/stress/shop__stress-20260101120000"
        );
        let mode = std::fs::metadata(&mount.host_path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o777);
    }
}
