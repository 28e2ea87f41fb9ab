use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

pub fn parse_via_string<'de, D, T, F>(deserializer: D, kind: &str, parser: F) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    F: FnOnce(&str) -> Result<T, String>,
{
    let raw = StringOrNumber::deserialize(deserializer)?.into_string();
    parser(&raw).map_err(|err| D::Error::custom(format!("invalid {kind} `{raw}`: {err}")))
}

/// YAML writes bare integers for values like `duration: 30`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(u64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::Text(raw) => raw,
            Self::Number(value) => value.to_string(),
        }
    }
}
