use super::{io_error, ResultsError};
use crate::shared::ids::{run_name_timestamp, RunId};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "report.html";

/// The on-disk results tree `<root>/<project>/<scenario>/<run_id>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsStore {
    root: PathBuf,
}

impl ResultsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run_id: &str) -> Result<PathBuf, ResultsError> {
        let parsed = RunId::parse(run_id).map_err(|reason| ResultsError::InvalidRunId {
            run_id: run_id.to_string(),
            reason,
        })?;
        let key = parsed.key().map_err(|reason| ResultsError::InvalidRunId {
            run_id: run_id.to_string(),
            reason,
        })?;
        Ok(self
            .root
            .join(key.project.as_str())
            .join(key.scenario.as_str())
            .join(parsed.as_str()))
    }

    /// Run directory that must exist on disk.
    pub fn existing_run_dir(&self, run_id: &str) -> Result<PathBuf, ResultsError> {
        let dir = self.run_dir(run_id)?;
        if !dir.is_dir() {
            return Err(ResultsError::NotFound {
                run_id: run_id.to_string(),
                what: "results directory",
            });
        }
        Ok(dir)
    }

    /// Every run directory in the tree, newest start timestamp first.
    pub fn completed_runs(&self) -> Result<Vec<String>, ResultsError> {
        let mut runs = Vec::new();
        for project in subdirectories(&self.root)? {
            for scenario in subdirectories(&project)? {
                for run in subdirectories(&scenario)? {
                    if let Some(name) = run.file_name().and_then(|name| name.to_str()) {
                        runs.push(name.to_string());
                    }
                }
            }
        }
        runs.sort_by(|a, b| {
            run_name_timestamp(b)
                .cmp(&run_name_timestamp(a))
                .then_with(|| a.cmp(b))
        });
        Ok(runs)
    }

    pub fn read_report(&self, run_id: &str) -> Result<String, ResultsError> {
        let path = self.existing_run_dir(run_id)?.join(REPORT_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ResultsError::NotFound {
                run_id: run_id.to_string(),
                what: "report",
            }),
            Err(err) => Err(io_error(&path, err)),
        }
    }
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, ResultsError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_error(dir, err)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| io_error(dir, err))?;
        let file_type = entry.file_type().map_err(|err| io_error(&entry.path(), err))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
