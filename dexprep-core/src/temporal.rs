//! Timestamp coercion and display formatting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

use crate::table::Scalar;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemporalError {
    #[error("unparseable timestamp '{0}'")]
    Unparseable(String),

    #[error("expected a timestamp, found {0}")]
    NotATimestamp(String),
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Coerce a cell to a UTC timestamp.
///
/// Missing cells (and blank strings) coerce to `Ok(None)`. Offsets are
/// converted to UTC; naive values are taken as UTC. Integers are accepted
/// only as compact `YYYYMMDD` dates, the form CSV readers type as numbers.
pub fn coerce_timestamp(value: &Scalar) -> Result<Option<DateTime<Utc>>, TemporalError> {
    match value {
        _ if value.is_null() => Ok(None),
        Scalar::Timestamp(ts) => Ok(Some(*ts)),
        Scalar::Str(s) => parse_timestamp(s),
        Scalar::Int(i) if (10_000_000..=99_999_999).contains(i) => {
            compact_date(&i.to_string()).map(Some)
        }
        other => Err(TemporalError::NotATimestamp(other.key_string())),
    }
}

fn compact_date(digits: &str) -> Result<DateTime<Utc>, TemporalError> {
    NaiveDate::parse_from_str(digits, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| TemporalError::Unparseable(digits.to_string()))
}

/// Parse a timestamp string in any of the formats data sources emit.
pub fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>, TemporalError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(s) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Some(Utc.from_utc_datetime(&naive)));
            }
        }
    }

    Err(TemporalError::Unparseable(s.to_string()))
}

/// ISO 8601 with explicit offset, e.g. `2024-01-02T00:00:00+00:00`.
pub fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Calendar day, `YYYY-MM-DD`.
pub fn day(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Minute resolution, `YYYY-MM-DD HH:MM`.
pub fn minute(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Whole days between two instants, truncated.
pub fn whole_days(min: &DateTime<Utc>, max: &DateTime<Utc>) -> i64 {
    (*max - *min).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parses_plain_dates_as_utc_midnight() {
        assert_eq!(
            parse_timestamp("2024-03-01").unwrap(),
            Some(utc(2024, 3, 1, 0, 0))
        );
    }

    #[test]
    fn test_parses_rfc3339_with_offset() {
        assert_eq!(
            parse_timestamp("2024-03-01T09:30:00-05:00").unwrap(),
            Some(utc(2024, 3, 1, 14, 30))
        );
    }

    #[test]
    fn test_parses_feed_dates() {
        assert_eq!(
            parse_timestamp("Fri, 01 Mar 2024 14:30:00 GMT").unwrap(),
            Some(utc(2024, 3, 1, 14, 30))
        );
    }

    #[test]
    fn test_parses_space_separated_offset() {
        assert_eq!(
            parse_timestamp("2024-03-01 14:30:00+00:00").unwrap(),
            Some(utc(2024, 3, 1, 14, 30))
        );
    }

    #[test]
    fn test_blank_and_null_are_missing() {
        assert_eq!(parse_timestamp("   ").unwrap(), None);
        assert_eq!(coerce_timestamp(&Scalar::Null).unwrap(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert_eq!(
            parse_timestamp("not a date"),
            Err(TemporalError::Unparseable("not a date".into()))
        );
        assert!(matches!(
            coerce_timestamp(&Scalar::Int(1_700_000_000)),
            Err(TemporalError::NotATimestamp(_))
        ));
        assert!(matches!(
            coerce_timestamp(&Scalar::Float(20240101.0)),
            Err(TemporalError::NotATimestamp(_))
        ));
    }

    #[test]
    fn test_compact_integer_dates() {
        assert_eq!(
            coerce_timestamp(&Scalar::Int(20240102)).unwrap(),
            Some(utc(2024, 1, 2, 0, 0))
        );
        assert_eq!(
            coerce_timestamp(&Scalar::Int(20241340)),
            Err(TemporalError::Unparseable("20241340".into()))
        );
    }

    #[test]
    fn test_formatting() {
        let ts = utc(2024, 3, 1, 14, 30);
        assert_eq!(iso(&ts), "2024-03-01T14:30:00+00:00");
        assert_eq!(day(&ts), "2024-03-01");
        assert_eq!(minute(&ts), "2024-03-01 14:30");
    }

    #[test]
    fn test_whole_days_truncates_partial_days() {
        assert_eq!(whole_days(&utc(2024, 1, 1, 0, 0), &utc(2024, 1, 3, 23, 0)), 2);
    }
}
