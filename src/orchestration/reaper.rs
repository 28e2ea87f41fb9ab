use super::registry::{RunRecord, RunRegistry};
use crate::shared::time::parse_iso_timestamp;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// True when a terminal record should be reclaimed. Age is measured from
/// `started_at`; an unparseable start time counts as stale.
pub fn is_stale(record: &RunRecord, ttl: Duration, now: DateTime<Utc>) -> bool {
    if !record.status.is_terminal() {
        return false;
    }
    let Some(started_at) = parse_iso_timestamp(&record.started_at) else {
        return true;
    };
    match (now - started_at).to_std() {
        Ok(age) => age > ttl,
        // started in the future
        Err(_) => false,
    }
}

/// Removes stale terminal records and returns how many went.
pub fn reap_stale_runs(registry: &RunRegistry, ttl: Duration, now: DateTime<Utc>) -> usize {
    registry.retain(|record| !is_stale(record, ttl, now))
}
