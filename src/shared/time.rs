use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

pub const RUN_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn run_stamp(at: DateTime<Utc>) -> String {
    at.format(RUN_STAMP_FORMAT).to_string()
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC).
pub fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_timestamps_round_trip_with_and_without_offset() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_iso_timestamp(&iso_timestamp(at)), Some(at));
        assert_eq!(parse_iso_timestamp("2026-03-01T12:30:00"), Some(at));
        assert_eq!(parse_iso_timestamp("yesterday"), None);
    }

    #[test]
    fn run_stamp_is_fourteen_digits() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(run_stamp(at), "20260301090507");
    }
}
