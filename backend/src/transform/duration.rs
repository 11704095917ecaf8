//! Time-duration strings to milliseconds.
//!
//! Accepted shapes are `M:S` and `H:M:S`. Components are not range checked:
//! `"0:75"` is 75 seconds and `"-1:00"` is minus one minute.

use crate::error::FormatError;

/// Convert `M:S` or `H:M:S` into total milliseconds.
///
/// # Example
/// ```
/// use quizstats::parse_duration_ms;
///
/// assert_eq!(parse_duration_ms("1:30").unwrap(), 90_000);
/// assert_eq!(parse_duration_ms("0:01:05").unwrap(), 65_000);
/// assert!(parse_duration_ms("1:2:3:4").is_err());
/// ```
pub fn parse_duration_ms(value: &str) -> Result<i64, FormatError> {
    let malformed = || FormatError(value.to_string());

    let parts = value
        .split(':')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(malformed()),
    };

    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .and_then(|total| total.checked_mul(1000))
        .ok_or_else(malformed)
}

/// Render a second count as `H:MM:SS`.
pub fn format_hms(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let secs = total_seconds.unsigned_abs();
    format!("{}{}:{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_seconds() {
        assert_eq!(parse_duration_ms("1:30").unwrap(), 90_000);
        assert_eq!(parse_duration_ms("0:00").unwrap(), 0);
        assert_eq!(parse_duration_ms("12:05").unwrap(), (12 * 60 + 5) * 1000);
    }

    #[test]
    fn test_hours_minutes_seconds() {
        assert_eq!(parse_duration_ms("0:01:05").unwrap(), 65_000);
        assert_eq!(parse_duration_ms("2:00:00").unwrap(), 7_200_000);
        assert_eq!(parse_duration_ms("1:02:03").unwrap(), (3600 + 120 + 3) * 1000);
    }

    #[test]
    fn test_out_of_range_components_are_accepted() {
        assert_eq!(parse_duration_ms("0:75").unwrap(), 75_000);
        assert_eq!(parse_duration_ms("0:90:00").unwrap(), 5_400_000);
        assert_eq!(parse_duration_ms("-1:00").unwrap(), -60_000);
    }

    #[test]
    fn test_whitespace_and_leading_zeros() {
        assert_eq!(parse_duration_ms(" 01 : 05 ").unwrap(), 65_000);
        assert_eq!(parse_duration_ms("00:00:09").unwrap(), 9_000);
    }

    #[test]
    fn test_wrong_component_count() {
        for bad in ["90", "1:2:3:4", "", "::::"] {
            let err = parse_duration_ms(bad).unwrap_err();
            assert_eq!(err, FormatError(bad.to_string()));
        }
    }

    #[test]
    fn test_non_integer_component() {
        assert!(parse_duration_ms("1:3x").is_err());
        assert!(parse_duration_ms("1.5:00").is_err());
        assert!(parse_duration_ms("a:b").is_err());
        assert!(parse_duration_ms("1:").is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        let huge = format!("{}:00:00", i64::MAX);
        assert!(parse_duration_ms(&huge).is_err());
    }

    #[test]
    fn test_error_carries_literal_input() {
        let err = parse_duration_ms("1:2:3:4").unwrap_err();
        assert_eq!(err.to_string(), "Invalid time format: 1:2:3:4");
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(65), "0:01:05");
        assert_eq!(format_hms(3 * 3600 + 7), "3:00:07");
        assert_eq!(format_hms(26 * 3600), "26:00:00");
        assert_eq!(format_hms(-90), "-0:01:30");
    }
}
