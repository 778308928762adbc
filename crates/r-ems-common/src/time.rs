//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};

/// Simulation clock value in whole seconds since the Unix epoch.
pub type Timestamp = i64;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_YEAR: f64 = 365.24;
const EPOCH_YEAR: i32 = 1970;

/// Calendar year used by the degradation model for a simulation timestamp.
///
/// Uses a fixed 365.24 day year rather than the civil calendar so pole ages
/// stay consistent with historical model runs.
pub fn simulation_year(t: Timestamp) -> i32 {
    EPOCH_YEAR + (t as f64 / SECONDS_PER_DAY / DAYS_PER_YEAR).floor() as i32
}

/// Elapsed hours from `since` to `now`; negative when `now` precedes `since`.
pub fn hours_between(since: Timestamp, now: Timestamp) -> f64 {
    (now - since) as f64 / SECONDS_PER_HOUR
}

/// Offset a timestamp by a fractional number of hours, rounding up to whole seconds.
///
/// Rounding up keeps `hours_between(t, add_hours(t, h)) >= h`.
pub fn add_hours(t: Timestamp, hours: f64) -> Timestamp {
    t.saturating_add((hours * SECONDS_PER_HOUR).ceil() as i64)
}

pub fn to_datetime(t: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t, 0)
}

/// Render a timestamp for logs and reports, falling back to the raw seconds.
pub fn display_timestamp(t: Timestamp) -> String {
    to_datetime(t)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{}s", t))
}
