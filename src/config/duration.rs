use crate::shared::serde_ext::parse_via_string;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Duration as written in configuration: bare seconds (`90`) or unit
/// groups (`30s`, `5m`, `1h30m`). The original text is kept because it is
/// handed to the worker verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDuration {
    raw: String,
    secs: u64,
}

impl RunDuration {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("duration must be non-empty".to_string());
        }
        if let Ok(secs) = trimmed.parse::<u64>() {
            return Ok(Self {
                raw: trimmed.to_string(),
                secs,
            });
        }

        let mut secs = 0_u64;
        let mut digits = String::new();
        for ch in trimmed.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let multiplier = match ch {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                other => return Err(format!("unknown duration unit `{other}`")),
            };
            if digits.is_empty() {
                return Err(format!("unit `{ch}` is missing a value"));
            }
            let value = digits
                .parse::<u64>()
                .map_err(|err| format!("invalid duration value: {err}"))?;
            secs = secs.saturating_add(value.saturating_mul(multiplier));
            digits.clear();
        }
        if !digits.is_empty() {
            return Err("trailing value is missing a unit (h, m or s)".to_string());
        }
        Ok(Self {
            raw: trimmed.to_string(),
            secs,
        })
    }

    pub fn from_secs(secs: u64) -> Self {
        Self {
            raw: format!("{secs}s"),
            secs,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }
}

impl std::fmt::Display for RunDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for RunDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for RunDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        parse_via_string(deserializer, "duration", RunDuration::parse)
    }
}
