//! Human-readable duration parsing (e.g., "30s", "168h").

use std::time::Duration;
use thiserror::Error;

/// Error parsing a duration string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duration '{input}' - expected format like '30s', '5m', '168h' or '7d'")]
pub struct DurationParseError {
    input: String,
}

impl DurationParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a duration string.
///
/// Supports bare seconds and the suffixes `ms`, `s`, `m`, `h` and `d`,
/// optionally with a leading `-`. Empty, zero and negative durations all
/// mean "disabled" and yield `None`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tileforge::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Some(Duration::from_secs(30)));
/// assert_eq!(parse_duration("168h").unwrap(), Some(Duration::from_secs(168 * 3600)));
/// assert_eq!(parse_duration("90").unwrap(), Some(Duration::from_secs(90)));
/// assert_eq!(parse_duration("-1s").unwrap(), None);
/// assert_eq!(parse_duration("").unwrap(), None);
/// ```
pub fn parse_duration(s: &str) -> Result<Option<Duration>, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };

    let lower = body.to_lowercase();
    let (num_str, millis_per_unit) = if let Some(n) = lower.strip_suffix("ms") {
        (n, 1u64)
    } else if let Some(n) = lower.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = lower.strip_suffix('h') {
        (n, 3_600_000)
    } else if let Some(n) = lower.strip_suffix('d') {
        (n, 86_400_000)
    } else {
        (lower.as_str(), 1_000)
    };

    let num: u64 = num_str.trim().parse().map_err(|_| DurationParseError::new(s))?;
    let millis = num
        .checked_mul(millis_per_unit)
        .ok_or_else(|| DurationParseError::new(s))?;

    if negative || millis == 0 {
        return Ok(None);
    }
    Ok(Some(Duration::from_millis(millis)))
}

/// Format a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return "0".to_string();
    };
    let millis = duration.as_millis();
    let units = [(86_400_000, "d"), (3_600_000, "h"), (60_000, "m"), (1_000, "s")];
    for (size, suffix) in units {
        if millis % size == 0 {
            return format!("{}{}", millis / size, suffix);
        }
    }
    format!("{}ms", millis)
}
