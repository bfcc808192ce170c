//! Timestamp parsing for backend date strings
//!
//! The backend sends due dates as bare ISO dates (`2025-02-01`) and
//! timestamps as ISO 8601 date-times with or without an offset. Values
//! without an offset are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse an ISO date or date-time into a UTC instant
///
/// A bare date resolves to midnight UTC. Returns `None` for anything
/// unparseable.
///
/// # Examples
///
/// ```
/// use alex_common::dates::parse_timestamp;
///
/// let due = parse_timestamp("2020-01-01").unwrap();
/// assert_eq!(due.to_rfc3339(), "2020-01-01T00:00:00+00:00");
/// assert!(parse_timestamp("next tuesday").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a required `YYYY-MM-DD` form date
pub fn parse_form_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2025-02-01T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_parse_naive_datetime_as_utc() {
        let dt = parse_timestamp("2025-02-01T10:30:00.123456").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let dt = parse_timestamp("2025-02-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2025, 2, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("02/01/2025").is_none());
    }

    #[test]
    fn test_parse_form_date() {
        assert!(parse_form_date("2025-02-01").is_some());
        assert!(parse_form_date("").is_none());
        assert!(parse_form_date("2025-13-01").is_none());
    }
}
