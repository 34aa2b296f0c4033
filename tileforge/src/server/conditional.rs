//! Last-Modified, If-Modified-Since and single byte-range handling.
//!
//! `If-Range` is not supported: the header is ignored and a `Range` is
//! always honoured against the current tile, even if the validator no
//! longer matches.

use chrono::{DateTime, Utc};
use std::time::SystemTime;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format(HTTP_DATE_FORMAT)
        .to_string()
}

/// Parse an HTTP date header value.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Whether a response for content last modified at `modified` can be
/// answered with 304 given the request's `If-Modified-Since` value.
///
/// Comparison is at whole-second resolution, the precision of HTTP dates.
pub fn is_not_modified(modified: SystemTime, if_modified_since: Option<&str>) -> bool {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

/// An inclusive byte range within a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered, never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a body of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Outcome of evaluating a `Range` header against a body length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// Serve the full body
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Evaluate a `Range` header value against a body of `len` bytes.
///
/// Only a single `bytes=` range is honoured; multi-range and malformed
/// headers fall back to the full body.
pub fn evaluate_range(header: Option<&str>, len: u64) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return RangeRequest::Full;
    };

    let range = match (first.trim(), last.trim()) {
        ("", "") => return RangeRequest::Full,
        ("", suffix) => {
            let Ok(suffix) = suffix.parse::<u64>() else {
                return RangeRequest::Full;
            };
            if suffix == 0 || len == 0 {
                return RangeRequest::Unsatisfiable;
            }
            ByteRange {
                start: len.saturating_sub(suffix),
                end: len - 1,
            }
        }
        (start, end) => {
            let Ok(start) = start.parse::<u64>() else {
                return RangeRequest::Full;
            };
            let end = if end.is_empty() {
                u64::MAX
            } else {
                match end.parse::<u64>() {
                    Ok(end) if end >= start => end,
                    _ => return RangeRequest::Full,
                }
            };
            if start >= len {
                return RangeRequest::Unsatisfiable;
            }
            ByteRange {
                start,
                end: end.min(len - 1),
            }
        }
    };

    RangeRequest::Partial(range)
}
