//! Date parsing and display formatting.
//!
//! Content arrives with either bare calendar dates (`2024-06-18`) or full
//! RFC 3339 timestamps. Both parse to `DateTime<Utc>`; bare dates are taken
//! as midnight UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a `YYYY-MM-DD` date or an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Format as `"June 18, 2024"`. Returns an empty string for unparseable input.
pub fn format_long_date(s: &str) -> String {
    parse_date(s)
        .map(|dt| dt.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Format as `"June 18, 2024 at 09:30 AM"`. Returns an empty string for
/// unparseable input.
pub fn format_long_datetime(s: &str) -> String {
    parse_date(s)
        .map(|dt| dt.format("%B %-d, %Y at %I:%M %p").to_string())
        .unwrap_or_default()
}

/// Whole and fractional days elapsed from `then` to `now`.
pub fn days_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_seconds() as f64 / 86_400.0
}

/// Serde helper for optional date fields that may hold either format.
pub fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}
