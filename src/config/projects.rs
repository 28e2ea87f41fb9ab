use super::RunDuration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_users() -> u32 {
    1
}

fn default_spawn_rate() -> u32 {
    1
}

fn default_run_time() -> RunDuration {
    RunDuration::from_secs(10)
}

fn default_project_host() -> String {
    "localhost".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParametricScenario {
    #[serde(default = "default_users")]
    pub users: u32,
    #[serde(default = "default_spawn_rate")]
    pub spawn_rate: u32,
    #[serde(default = "default_run_time")]
    pub run_time: RunDuration,
}

impl Default for ParametricScenario {
    fn default() -> Self {
        Self {
            users: default_users(),
            spawn_rate: default_spawn_rate(),
            run_time: default_run_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stage {
    pub duration: RunDuration,
    pub users: u32,
    pub spawn_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagedScenario {
    pub stages: Vec<Stage>,
}

/// Both shapes share one configuration slot; a `stages` list selects
/// the staged form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioSpec {
    Staged(StagedScenario),
    Parametric(ParametricScenario),
}

impl ScenarioSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Staged(_) => "staged",
            Self::Parametric(_) => "parametric",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Parametric(_) => Ok(()),
            Self::Staged(staged) => {
                if staged.stages.is_empty() {
                    return Err("staged scenario must define at least one stage".to_string());
                }
                if let Some(index) = staged
                    .stages
                    .iter()
                    .position(|stage| stage.duration.as_secs() == 0)
                {
                    return Err(format!("stage {index} must have a non-zero duration"));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_project_host")]
    pub host: String,
    #[serde(default)]
    pub scenarios: BTreeMap<String, ScenarioSpec>,
}

impl ProjectSpec {
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_slot_resolves_to_the_matching_variant() {
        let project: ProjectSpec = serde_yaml::from_str(
            r#"
host: http://target
scenarios:
  stress: { users: 10, spawn_rate: 2, run_time: 1m }
  smoke: {}
  ramp:
    stages:
      - { duration: 10s, users: 5, spawn_rate: 1 }
      - { duration: 20, users: 10, spawn_rate: 2 }
"#,
        )
        .expect("parse project");

        match &project.scenarios["stress"] {
            ScenarioSpec::Parametric(spec) => {
                assert_eq!(spec.users, 10);
                assert_eq!(spec.run_time.as_secs(), 60);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(
            project.scenarios["smoke"],
            ScenarioSpec::Parametric(ParametricScenario::default())
        );
        match &project.scenarios["ramp"] {
            ScenarioSpec::Staged(spec) => {
                assert_eq!(spec.stages.len(), 2);
                assert_eq!(spec.stages[1].duration.as_secs(), 20);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(project.display_name("shop"), "shop");
    }

    #[test]
    fn misspelled_fields_are_rejected() {
        let parsed = serde_yaml::from_str::<ScenarioSpec>("{ user: 10 }");
        assert!(parsed.is_err());
    }

    #[test]
    fn empty_stage_lists_fail_validation() {
        let spec = ScenarioSpec::Staged(StagedScenario { stages: Vec::new() });
        assert!(spec.validate().is_err());
    }
}
