#![allow(dead_code)]

use loadrun::config::Settings;
use loadrun::container::{
    ContainerError, ContainerFilter, ContainerId, ContainerInfo, ContainerRuntime, ContainerSpec,
    MANAGED_LABEL,
};
use loadrun::orchestration::{ReportFetchError, RunEngine, WorkerReportClient};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Default)]
struct FakeState {
    containers: BTreeMap<String, ContainerInfo>,
    specs: Vec<ContainerSpec>,
    next_id: u32,
    stops: Vec<String>,
    removes: Vec<String>,
}

/// In-memory container runtime. Started containers take `start_status`.
#[derive(Debug)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
    start_status: String,
    run_delay: Duration,
    stuck: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            start_status: "running".to_string(),
            run_delay: Duration::ZERO,
            stuck: false,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_status(mut self, status: &str) -> Self {
        self.start_status = status.to_string();
        self
    }

    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Stop and remove fail for every container.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Adds a managed container that no run record knows about.
    pub fn seed_managed(&self, id: &str, status: &str) {
        self.state().containers.insert(
            id.to_string(),
            ContainerInfo {
                id: id.to_string(),
                name: format!("leftover_{id}"),
                status: status.to_string(),
                image: "locustio/locust:latest".to_string(),
                labels: BTreeMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]),
                ports: BTreeMap::new(),
            },
        );
    }

    pub fn set_status(&self, id: &str, status: &str) {
        if let Some(info) = self.state().containers.get_mut(id) {
            info.status = status.to_string();
        }
    }

    pub fn run_count(&self) -> usize {
        self.state().specs.len()
    }

    pub fn specs(&self) -> Vec<ContainerSpec> {
        self.state().specs.clone()
    }

    pub fn stops(&self) -> Vec<String> {
        self.state().stops.clone()
    }

    pub fn removes(&self) -> Vec<String> {
        self.state().removes.clone()
    }

    /// Most `run` calls observed executing at the same time.
    pub fn peak_concurrent_runs(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn container(&self, id: &str) -> Option<ContainerInfo> {
        self.state().containers.get(id).cloned()
    }

    fn failure(operation: &str) -> ContainerError {
        ContainerError::CommandFailed {
            operation: operation.to_string(),
            exit_code: 1,
            stderr: "daemon refused".to_string(),
        }
    }
}

impl ContainerRuntime for FakeRuntime {
    fn list(&self, filter: ContainerFilter) -> Result<Vec<ContainerInfo>, ContainerError> {
        Ok(self
            .state()
            .containers
            .values()
            .filter(|info| info.labels.get(MANAGED_LABEL).map(String::as_str) == Some("true"))
            .filter(|info| filter == ContainerFilter::All || info.is_running())
            .cloned()
            .collect())
    }

    fn run(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.run_delay.is_zero() {
            thread::sleep(self.run_delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("fake{:020}", state.next_id);
        let ports = spec
            .ports
            .iter()
            .map(|binding| (binding.container_port, binding.host_port))
            .collect();
        state.containers.insert(
            id.clone(),
            ContainerInfo {
                id: id.clone(),
                name: spec.name.clone(),
                status: self.start_status.clone(),
                image: spec.image.clone(),
                labels: spec.labels.clone(),
                ports,
            },
        );
        state.specs.push(spec.clone());
        Ok(ContainerId::new(id))
    }

    fn inspect(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        self.state()
            .containers
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ContainerError::NotFound {
                handle: id.to_string(),
            })
    }

    fn stop(&self, id: &ContainerId, _grace: Duration) -> Result<(), ContainerError> {
        let mut state = self.state();
        state.stops.push(id.to_string());
        if self.stuck {
            return Err(Self::failure("stop"));
        }
        match state.containers.get_mut(id.as_str()) {
            Some(info) => {
                info.status = "exited".to_string();
                Ok(())
            }
            None => Err(ContainerError::NotFound {
                handle: id.to_string(),
            }),
        }
    }

    fn remove(&self, id: &ContainerId, _force: bool) -> Result<(), ContainerError> {
        let mut state = self.state();
        state.removes.push(id.to_string());
        if self.stuck {
            return Err(Self::failure("rm"));
        }
        // docker rm also accepts container names
        let key = state
            .containers
            .iter()
            .find(|(key, info)| key.as_str() == id.as_str() || info.name == id.as_str())
            .map(|(key, _)| key.clone());
        match key {
            Some(key) => {
                state.containers.remove(&key);
                Ok(())
            }
            None => Err(ContainerError::NotFound {
                handle: id.to_string(),
            }),
        }
    }

    fn logs(&self, _id: &ContainerId, max_bytes: usize) -> Result<String, ContainerError> {
        let logs = "Traceback: locustfile not found\n".repeat(50);
        Ok(logs.chars().take(max_bytes).collect())
    }
}

/// Report client returning a fixed body, or a 500 when none is set.
#[derive(Debug, Default)]
pub struct FakeReportClient {
    body: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl FakeReportClient {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}

impl WorkerReportClient for FakeReportClient {
    fn fetch_report(
        &self,
        worker_url: &str,
        _timeout: Duration,
    ) -> Result<String, ReportFetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(worker_url.to_string());
        self.body.clone().ok_or_else(|| ReportFetchError::Status {
            url: format!("{worker_url}/stats/report"),
            status: 500,
        })
    }
}

pub fn settings_for(root: &Path, allow_parallel: bool) -> Settings {
    let yaml = format!(
        r#"
allow_parallel: {allow_parallel}
stale_run_ttl_seconds: 60
public_host: http://loadrun.test
ports: {{ fixed: 8080, min: 9000, max: 9010 }}
paths:
  tmp_root: {tmp}
  scenarios_root: {scenarios}
projects:
  shop:
    name: Shop
    host: http://shop.internal
    scenarios:
      stress: {{ users: 10, spawn_rate: 2, run_time: 1m }}
      browse: {{}}
      ramp:
        stages:
          - {{ duration: 10s, users: 5, spawn_rate: 1 }}
          - {{ duration: 20, users: 10, spawn_rate: 2 }}
"#,
        tmp = root.join("tmp").display(),
        scenarios = root.join("scenarios").display(),
    );
    let settings: Settings = serde_yaml::from_str(&yaml).expect("parse test settings");
    settings.validate().expect("valid test settings");
    settings
}

pub struct Harness {
    pub dir: TempDir,
    pub runtime: Arc<FakeRuntime>,
    pub reports: Arc<FakeReportClient>,
    pub engine: Arc<RunEngine>,
}

pub fn harness_with(
    allow_parallel: bool,
    runtime: FakeRuntime,
    reports: FakeReportClient,
) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("scenarios/shop")).expect("scenarios dir");
    let settings = settings_for(dir.path(), allow_parallel);
    let runtime = Arc::new(runtime);
    let reports = Arc::new(reports);
    let engine = RunEngine::new(settings, runtime.clone(), reports.clone()).expect("engine");
    Harness {
        dir,
        runtime,
        reports,
        engine: Arc::new(engine),
    }
}

pub fn harness(allow_parallel: bool) -> Harness {
    harness_with(allow_parallel, FakeRuntime::new(), FakeReportClient::failing())
}
