use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub fn validate_identifier_value(kind: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{kind} must be non-empty"));
    }
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(format!(
            "{kind} must use only ASCII letters, digits, '-' or '_'"
        ));
    }
    Ok(())
}

fn validate_project_value(kind: &str, value: &str) -> Result<(), String> {
    validate_identifier_value(kind, value)?;
    if value.contains(RUN_KEY_SEPARATOR) {
        return Err(format!("{kind} must not contain `{RUN_KEY_SEPARATOR}`"));
    }
    Ok(())
}

macro_rules! define_id_type {
    ($name:ident, $kind:literal, $validate:path) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: &str) -> Result<Self, String> {
                $validate($kind, raw)?;
                Ok(Self(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(|err| {
                    D::Error::custom(format!("invalid {} `{}`: {}", $kind, raw, err))
                })
            }
        }
    };
}

define_id_type!(ProjectName, "project name", validate_project_value);
define_id_type!(ScenarioName, "scenario name", validate_identifier_value);

pub const RUN_KEY_SEPARATOR: &str = "__";
pub const RUN_TIMESTAMP_DIGITS: usize = 14;

/// Groups repeated runs of one scenario: `<project>__<scenario>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub project: ProjectName,
    pub scenario: ScenarioName,
}

impl RunKey {
    pub fn new(project: ProjectName, scenario: ScenarioName) -> Self {
        Self { project, scenario }
    }

    pub fn prefix(&self) -> String {
        format!("{}{RUN_KEY_SEPARATOR}{}", self.project, self.scenario)
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Run identity `<project>__<scenario>-<digits>`, where the first 14 digits
/// are the UTC start timestamp `YYYYmmddHHMMSS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn compose(key: &RunKey, stamp: &str) -> Self {
        Self(format!("{}-{stamp}", key.prefix()))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let id = Self(raw.to_string());
        id.key()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key(&self) -> Result<RunKey, String> {
        let (prefix, stamp) = self
            .0
            .rsplit_once('-')
            .ok_or_else(|| format!("run id `{}` is missing a timestamp", self.0))?;
        if stamp.is_empty() || !stamp.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(format!("run id `{}` has a non-numeric timestamp", self.0));
        }
        let (project, scenario) = prefix.split_once(RUN_KEY_SEPARATOR).ok_or_else(|| {
            format!(
                "run id `{}` is missing the `{RUN_KEY_SEPARATOR}` separator",
                self.0
            )
        })?;
        Ok(RunKey::new(
            ProjectName::parse(project)?,
            ScenarioName::parse(scenario)?,
        ))
    }

    pub fn has_key(&self, key: &RunKey) -> bool {
        self.0
            .rsplit_once('-')
            .map(|(prefix, _)| prefix == key.prefix())
            .unwrap_or(false)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Sort key used for historical listings. Names without a conforming
/// timestamp sort as zero.
pub fn run_name_timestamp(name: &str) -> u64 {
    let Some((_, stamp)) = name.rsplit_once('-') else {
        return 0;
    };
    if stamp.len() < RUN_TIMESTAMP_DIGITS || !stamp.chars().all(|ch| ch.is_ascii_digit()) {
        return 0;
    }
    stamp[..RUN_TIMESTAMP_DIGITS].parse().unwrap_or(0)
}
