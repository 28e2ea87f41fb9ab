use super::EngineError;
use crate::config::Settings;
use crate::shared::ids::{ProjectName, RunId, RunKey, ScenarioName};
use std::fs;
use std::path::{Path, PathBuf};

/// Worker-side mount points. The worker image reads scenarios from
/// `/tests` and writes artifacts under `/results`.
pub const WORKER_SCENARIOS_DIR: &str = "/tests";
pub const WORKER_RESULTS_DIR: &str = "/results";
pub const WORKER_SHAPES_DIR: &str = "/shapes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    pub tmp_root: PathBuf,
    pub scenarios_root: PathBuf,
}

impl EnginePaths {
    pub fn new(tmp_root: impl Into<PathBuf>, scenarios_root: impl Into<PathBuf>) -> Self {
        Self {
            tmp_root: tmp_root.into(),
            scenarios_root: scenarios_root.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.paths.tmp_root, &settings.paths.scenarios_root)
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        vec![self.results_root(), self.shapes_root(), self.logs_dir()]
    }

    pub fn results_root(&self) -> PathBuf {
        self.tmp_root.join("results")
    }

    pub fn shapes_root(&self) -> PathBuf {
        self.tmp_root.join("shapes")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.tmp_root.join("logs")
    }

    pub fn engine_log_path(&self) -> PathBuf {
        self.logs_dir().join("engine.log")
    }

    pub fn run_results_dir(&self, key: &RunKey, run_id: &RunId) -> PathBuf {
        self.results_root()
            .join(key.project.as_str())
            .join(key.scenario.as_str())
            .join(run_id.as_str())
    }

    pub fn shape_file(&self, project: &ProjectName, scenario: &ScenarioName) -> PathBuf {
        self.shapes_root()
            .join(project.as_str())
            .join(format!("{scenario}.json"))
    }
}

pub fn worker_results_dir(key: &RunKey, run_id: &RunId) -> String {
    format!(
        "{WORKER_RESULTS_DIR}/{}/{}/{}",
        key.project, key.scenario, run_id
    )
}

pub fn worker_shape_file(project: &ProjectName, scenario: &ScenarioName) -> String {
    format!("{WORKER_SHAPES_DIR}/{project}/{scenario}.json")
}

/// Absolute form of `path`, resolved against the current directory.
/// Container runtimes reject relative bind sources.
pub fn absolute_path(path: &Path) -> Result<PathBuf, EngineError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| EngineError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(cwd.join(path))
}

pub fn bootstrap_engine_paths(paths: &EnginePaths) -> Result<(), EngineError> {
    for path in paths.required_directories() {
        fs::create_dir_all(&path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_results_dir_nests_project_scenario_and_run() {
        let paths = EnginePaths::new("/var/loadrun/tmp", "/srv/scenarios");
        let run_id = RunId::parse("shop__stress-20260101120000").expect("run id");
        let key = run_id.key().expect("key");
        assert_eq!(
            paths.run_results_dir(&key, &run_id),
            PathBuf::from("/var/loadrun/tmp/results/shop/stress/shop__stress-20260101120000")
        );
        assert_eq!(
            worker_results_dir(&key, &run_id),
            "/results/shop/stress/shop__stress-20260101120000"
        );
        assert_eq!(
            worker_shape_file(&key.project, &key.scenario),
            "/shapes/shop/stress.json"
        );
    }

    #[test]
    fn bootstrap_creates_required_directories() {
        let dir = tempdir().expect("tempdir");
        let paths = EnginePaths::new(dir.path().join("tmp"), dir.path().join("scenarios"));
        bootstrap_engine_paths(&paths).expect("bootstrap");
        for required in paths.required_directories() {
            assert!(required.is_dir(), "missing {}", required.display());
        }
    }
}
