//! Normalization of machine-readable instants.
//!
//! Epoch seconds and ISO-like datetime strings become a UTC instant, or
//! `None`. Nothing here returns an error: a value that does not parse is
//! simply absent.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Formats that carry their own UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Naive datetime formats, read in the caller-supplied offset.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y, %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y at %I:%M %p",
    "%B %d %Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%d %B %Y at %H:%M",
    "%A, %B %d, %Y %I:%M %p",
    "%A, %B %d, %Y at %I:%M %p",
    "%A %B %d %Y %H:%M:%S",
];

/// Date-only formats, read as midnight in the caller-supplied offset.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
];

/// Largest magnitude of epoch seconds accepted (year ~ +/-292,000).
const MAX_EPOCH_SECONDS: f64 = 9.2e15;

/// Convert Unix epoch seconds to a UTC instant.
///
/// The value is scaled to milliseconds before conversion, so fractional
/// seconds survive to millisecond precision.
pub fn normalize_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds.abs() > MAX_EPOCH_SECONDS {
        return None;
    }
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Parse a raw epoch-seconds string (integer or decimal).
pub fn normalize_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<i64>() {
        let millis = secs.checked_mul(1000)?;
        return Utc.timestamp_millis_opt(millis).single();
    }
    // Reject "inf"/"NaN" spellings before they reach the float parser.
    if !raw
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    normalize_epoch_seconds(raw.parse::<f64>().ok()?)
}

/// Parse an ISO-like datetime string.
///
/// Strings without an explicit offset are read in `assume_offset`, which the
/// resolver sets to the reference clock's offset.
pub fn normalize_iso(raw: &str, assume_offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_calendar(raw, assume_offset)
}

/// General calendar date/time parse shared with the relative parser's
/// last-resort rule.
pub(crate) fn parse_calendar(text: &str, assume_offset: FixedOffset) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return localize(naive, assume_offset);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return localize(date.and_hms_opt(0, 0, 0)?, assume_offset);
        }
    }
    None
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn plus8() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    #[test]
    fn test_epoch_integer() {
        let dt = normalize_epoch("1757745240").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
    }

    #[test]
    fn test_epoch_fractional_keeps_millis() {
        let dt = normalize_epoch("1757745240.25").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_757_745_240_250);
    }

    #[test]
    fn test_epoch_rejects_non_finite_and_junk() {
        assert!(normalize_epoch("").is_none());
        assert!(normalize_epoch("NaN").is_none());
        assert!(normalize_epoch("inf").is_none());
        assert!(normalize_epoch("12abc").is_none());
        assert!(normalize_epoch_seconds(f64::INFINITY).is_none());
        assert!(normalize_epoch_seconds(f64::NAN).is_none());
        assert!(normalize_epoch("9999999999999999999").is_none());
    }

    #[test]
    fn test_epoch_zero_is_a_real_instant() {
        // The epoch itself is a valid input, distinct from "unresolved".
        assert_eq!(normalize_epoch("0").unwrap().timestamp(), 0);
    }

    #[test]
    fn test_iso_with_offset() {
        let dt = normalize_iso("2025-09-13T14:34:00+08:00", utc()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
        let z = normalize_iso("2025-09-13T06:34:00.000Z", plus8()).unwrap();
        assert_eq!(z, dt);
    }

    #[test]
    fn test_iso_compact_offset() {
        let dt = normalize_iso("2025-09-13T14:34:00+0800", utc()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
    }

    #[test]
    fn test_iso_naive_uses_assumed_offset() {
        let dt = normalize_iso("2025-09-13T14:34:00", plus8()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
        let date_only = normalize_iso("2025-09-13", plus8()).unwrap();
        assert_eq!(date_only.to_rfc3339(), "2025-09-12T16:00:00+00:00");
    }

    #[test]
    fn test_iso_rejects_garbage() {
        assert!(normalize_iso("", utc()).is_none());
        assert!(normalize_iso("not a date", utc()).is_none());
        assert!(normalize_iso("2025-13-45", utc()).is_none());
    }

    #[test]
    fn test_calendar_long_form() {
        let dt = parse_calendar("Saturday, September 13, 2025 at 2:34 PM", plus8()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
    }

    #[test]
    fn test_calendar_rfc2822() {
        let dt = parse_calendar("Sat, 13 Sep 2025 06:34:00 +0000", plus8()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-09-13T06:34:00+00:00");
    }
}
