//! Conditional request handling
//!
//! `If-Modified-Since` evaluation and HTTP-date formatting. Dates are
//! compared at whole-second granularity, the resolution of HTTP-date.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::SystemTime;

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Outcome of a conditional check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditional {
    /// Client copy is current; answer 304
    NotModified,
    /// Serve the resource normally
    Proceed,
}

/// Format a timestamp as an HTTP-date
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP-date, accepting IMF-fixdate and RFC 2822 spellings
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Compare `If-Modified-Since` against the resource's modification time
///
/// # Examples
/// ```
/// use statikd::http::conditional::{evaluate, http_date, Conditional};
/// use std::time::{Duration, SystemTime};
///
/// let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
/// let header = http_date(modified);
/// assert_eq!(evaluate(Some(&header), modified), Conditional::NotModified);
/// assert_eq!(evaluate(None, modified), Conditional::Proceed);
/// ```
pub fn evaluate(if_modified_since: Option<&str>, last_modified: SystemTime) -> Conditional {
    let Some(since) = if_modified_since.and_then(parse_http_date) else {
        return Conditional::Proceed;
    };

    let modified = DateTime::<Utc>::from(last_modified).timestamp();
    if since.timestamp() >= modified {
        Conditional::NotModified
    } else {
        Conditional::Proceed
    }
}
