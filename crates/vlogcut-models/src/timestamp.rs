//! Timestamp parsing and formatting.
//!
//! Annotation files and cutting plans both carry clock-style timestamps.
//! Parsing accepts `H:M:S`, `M:S` and bare seconds (each component may be
//! fractional); formatting always produces whole-second `HH:MM:SS`.

use thiserror::Error;

/// Parse a timestamp string to total seconds.
///
/// # Examples
/// ```
/// use vlogcut_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => ("0", "0", *s),
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(TimestampError::InvalidFormat(ts.to_string())),
    };

    let hours = parse_component("hours", hours)?;
    let minutes = parse_component("minutes", minutes)?;
    let seconds = parse_component("seconds", seconds)?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_component(name: &'static str, raw: &str) -> Result<f64, TimestampError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| TimestampError::InvalidValue(name, raw.to_string()))?;
    if !value.is_finite() {
        return Err(TimestampError::InvalidValue(name, raw.to_string()));
    }
    if value < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(value)
}

/// Format seconds as `HH:MM:SS`, truncating any fractional part.
///
/// Negative and non-finite inputs format as `00:00:00`.
pub fn format_seconds(total_secs: f64) -> String {
    let whole = if total_secs.is_finite() && total_secs > 0.0 {
        total_secs.floor() as u64
    } else {
        0
    };
    let hours = whole / 3600;
    let mins = (whole % 3600) / 60;
    let secs = whole % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// Strip separators from a timestamp for use in file names (`00:01:30` -> `000130`).
pub fn format_compact(ts: &str) -> String {
    ts.chars().filter(|c| *c != ':').collect()
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use HH:MM:SS, MM:SS, or SS")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_hh_mm_ss() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("00:01:00").unwrap(), 60.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
    }

    #[test]
    fn test_parse_timestamp_short_forms() {
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert_eq!(parse_timestamp("1:2:3").unwrap(), 3723.0);
        assert!((parse_timestamp("00:00:30.5").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("  "), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("ab:cd"), Err(TimestampError::InvalidValue("minutes", _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timestamp("-5"), Err(TimestampError::Negative)));
        assert!(parse_timestamp("inf").is_err());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.9), "01:01:01");
        assert_eq!(format_seconds(-3.0), "00:00:00");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact("00:01:30"), "000130");
    }
}
