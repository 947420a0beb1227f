//! Timestamp parsing for container attributes and archive listings.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Layout of the `image_datetime_valid` attribute, e.g. `01-JAN-2024;00:05:00.000`.
///
/// Month names are matched case-insensitively and the fractional seconds are
/// optional.
pub const VALID_TIME_FORMAT: &str = "%d-%b-%Y;%H:%M:%S%.f";

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// Parse a layer valid-time attribute.
///
/// The value carries no zone; it is labelled UTC without conversion.
pub fn parse_valid_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let cleaned = s.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(cleaned, VALID_TIME_FORMAT)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|_| TimeParseError::InvalidFormat(cleaned.to_string()))
}

/// Parse an ISO 8601 timestamp as found in archive listings.
///
/// Timestamps without an offset are assumed to be UTC.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    // Try full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try without timezone (assume UTC), with and without fractional seconds
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    // Try date only
    if let Ok(ndt) =
        NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Timelike};

    #[test]
    fn test_parse_valid_time() {
        let dt = parse_valid_time("01-JAN-2024;00:05:00.000000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap());
    }

    #[test]
    fn test_parse_valid_time_fraction_is_seconds() {
        let dt = parse_valid_time("15-Jun-2023;13:45:10.500000").unwrap();
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_parse_valid_time_strips_padding() {
        let dt = parse_valid_time("01-JAN-2024;00:10:00.000\0\0\0").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 0, 10, 0).unwrap());
    }

    #[test]
    fn test_parse_valid_time_steps() {
        let a = parse_valid_time("01-JAN-2024;00:00:00.000000").unwrap();
        let b = parse_valid_time("01-JAN-2024;00:05:00.000000").unwrap();
        assert_eq!(b - a, Duration::minutes(5));
    }

    #[test]
    fn test_parse_valid_time_rejects_iso() {
        assert!(parse_valid_time("2024-01-01T00:00:00Z").is_err());
        assert!(parse_valid_time("").is_err());
    }

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_iso8601("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_iso8601_offset_and_naive() {
        let with_offset = parse_iso8601("2024-01-15T13:00:00+01:00").unwrap();
        let naive = parse_iso8601("2024-01-15T12:00:00.250").unwrap();
        assert_eq!(with_offset, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(naive - with_offset, Duration::milliseconds(250));
    }
}
