//! Millisecond timestamp conversions.
//!
//! Archives store instants as `i64` milliseconds since the Unix epoch (UTC).
//! Callers pass `DateTime<Utc>`, which can carry sub-millisecond precision,
//! so query bounds are rounded toward the inside of the window:
//!
//! - a window start rounds up ([`millis_ceil`]): `t >= 10.4ms` holds for
//!   integer `t` exactly when `t >= 11`.
//! - a window end rounds down ([`millis_floor`]): `t <= 10.4ms` holds for
//!   integer `t` exactly when `t <= 10`.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{ArchiveResult, TimestampOutOfRangeSnafu};

const NANOS_PER_MILLI: u32 = 1_000_000;

/// Convert stored milliseconds into a UTC instant.
pub fn millis_to_datetime(millis: i64) -> ArchiveResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| TimestampOutOfRangeSnafu { millis }.build())
}

/// Largest whole millisecond not after `ts`.
pub fn millis_floor(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Smallest whole millisecond not before `ts`.
pub fn millis_ceil(ts: DateTime<Utc>) -> i64 {
    let floor = millis_floor(ts);
    if ts.timestamp_subsec_nanos() % NANOS_PER_MILLI == 0 {
        floor
    } else {
        floor.saturating_add(1)
    }
}
