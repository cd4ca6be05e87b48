//! Timestamp parsing for backend records.
//!
//! The backend writes naive UTC ISO-8601 strings (no offset), while some
//! fields arrive as full RFC 3339. Both are accepted here.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Display format for timestamps, e.g. `Jan 05, 2024, 14:30`.
pub const DISPLAY_FORMAT: &str = "%b %d, %Y, %H:%M";

/// Parse a backend timestamp. Naive values are interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format a backend timestamp in local time, `N/A` when missing or invalid.
pub fn format_timestamp(raw: Option<&str>) -> String {
    format_timestamp_in(raw, &Local)
}

/// Format a backend timestamp in the given zone.
pub fn format_timestamp_in<Tz: TimeZone>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    raw.and_then(parse_timestamp)
        .map(|dt| dt.with_timezone(tz).format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
