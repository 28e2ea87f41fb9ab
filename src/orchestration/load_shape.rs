use super::error::{io_error, json_error};
use super::EngineError;
use crate::config::StagedScenario;
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::{ProjectName, ScenarioName};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const LOAD_SHAPE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeStage {
    pub duration_secs: u64,
    pub users: u32,
    pub spawn_rate: u32,
}

/// Load profile handed to a staged worker through `LOAD_SHAPE_FILE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadShape {
    pub version: u32,
    pub project: String,
    pub scenario: String,
    pub stages: Vec<ShapeStage>,
}

impl LoadShape {
    pub fn from_staged(
        project: &ProjectName,
        scenario: &ScenarioName,
        staged: &StagedScenario,
    ) -> Self {
        Self {
            version: LOAD_SHAPE_VERSION,
            project: project.to_string(),
            scenario: scenario.to_string(),
            stages: staged
                .stages
                .iter()
                .map(|stage| ShapeStage {
                    duration_secs: stage.duration.as_secs(),
                    users: stage.users,
                    spawn_rate: stage.spawn_rate,
                })
                .collect(),
        }
    }

    /// `(users, spawn_rate)` to hold at `elapsed_secs`; `None` once every
    /// stage has run out. Each stage ends at the sum of the durations up to
    /// and including it.
    pub fn tick(&self, elapsed_secs: u64) -> Option<(u32, u32)> {
        let mut end_offset = 0_u64;
        for stage in &self.stages {
            end_offset = end_offset.saturating_add(stage.duration_secs);
            if elapsed_secs < end_offset {
                return Some((stage.users, stage.spawn_rate));
            }
        }
        None
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.stages
            .iter()
            .map(|stage| stage.duration_secs)
            .fold(0, u64::saturating_add)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), EngineError> {
        let body = serde_json::to_vec_pretty(self).map_err(|e| json_error(path, e))?;
        atomic_write_file(path, &body).map_err(|e| io_error(path, e))
    }

    pub fn read_from(path: &Path) -> Result<Self, EngineError> {
        let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let shape: Self = serde_json::from_str(&raw).map_err(|e| json_error(path, e))?;
        if shape.version != LOAD_SHAPE_VERSION {
            return Err(EngineError::Validation(format!(
                "unsupported load shape version {} in {}",
                shape.version,
                path.display()
            )));
        }
        Ok(shape)
    }
}
