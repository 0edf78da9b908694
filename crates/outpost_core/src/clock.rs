//! ISO-8601 timestamps for record stamping.
//!
//! All stamps are UTC with millisecond precision and a `Z` suffix, e.g.
//! `2024-05-01T12:30:00.125Z`, so they sort lexicographically in time order.

use chrono::{DateTime, SecondsFormat, Utc};

/// Returns the current time as an ISO-8601 string.
#[must_use]
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

/// Returns a stamp strictly later than `previous`.
///
/// Normally this is the current time. When the clock has not advanced past
/// `previous` (two mutations within one millisecond, or a clock step
/// backwards) the stamp is `previous + 1ms`. Unparseable previous stamps
/// are ignored.
#[must_use]
pub fn stamp_after(previous: Option<&str>) -> String {
    let now_ms = Utc::now().timestamp_millis();
    let ms = match previous.and_then(parse_iso) {
        Some(prev) => now_ms.max(prev.timestamp_millis() + 1),
        None => now_ms,
    };

    DateTime::<Utc>::from_timestamp_millis(ms).map_or_else(now_iso, format_iso)
}

/// Parses an RFC 3339 / ISO-8601 timestamp into UTC.
#[must_use]
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
