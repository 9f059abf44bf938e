//! Publish date parsing for article ordering.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-times carrying a UTC offset, e.g. Jekyll's `2024-05-01 10:00:00 +0900`.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y/%m/%d %H:%M:%S%.f %z",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse the date shapes frontmatter tends to carry.
///
/// Accepts RFC 3339 and other offset date-times (normalized to UTC), local
/// date-times with `T` or a space separator, and bare `YYYY-MM-DD` or
/// `YYYY/MM/DD` dates (midnight). Returns `None` for anything else.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_utc());
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.naive_utc());
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_bare_date() {
        assert_eq!(parse_date("2020-01-01"), Some(ymd_hms(2020, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_rfc3339_normalized_to_utc() {
        assert_eq!(
            parse_date("2021-06-01T12:00:00+02:00"),
            Some(ymd_hms(2021, 6, 1, 10, 0, 0))
        );
        assert_eq!(
            parse_date("1979-05-27T07:32:00Z"),
            Some(ymd_hms(1979, 5, 27, 7, 32, 0))
        );
    }

    #[test]
    fn test_local_datetimes() {
        assert_eq!(
            parse_date("2021-06-01 08:30:15"),
            Some(ymd_hms(2021, 6, 1, 8, 30, 15))
        );
        assert_eq!(
            parse_date("2021-06-01T08:30"),
            Some(ymd_hms(2021, 6, 1, 8, 30, 0))
        );
    }

    #[test]
    fn test_offset_datetimes_normalized_to_utc() {
        assert_eq!(
            parse_date("2024-05-01 10:00:00 +0900"),
            Some(ymd_hms(2024, 5, 1, 1, 0, 0))
        );
        assert_eq!(
            parse_date("2024-05-01 10:00:00.250 -05:00"),
            Some(ymd_hms(2024, 5, 1, 15, 0, 0).with_nanosecond(250_000_000).unwrap())
        );
        assert_eq!(
            parse_date("2024-05-01T10:00:00+0200"),
            Some(ymd_hms(2024, 5, 1, 8, 0, 0))
        );
    }

    #[test]
    fn test_slash_dates() {
        assert_eq!(parse_date("2023/01/01"), Some(ymd_hms(2023, 1, 1, 0, 0, 0)));
        assert_eq!(
            parse_date("2023/01/01 09:15"),
            Some(ymd_hms(2023, 1, 1, 9, 15, 0))
        );
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-13-01"), None);
    }
}
