//! Access log line formats
//!
//! `combined` and `common` follow the Apache layouts, `json` emits one
//! object per line, and anything else is treated as a `$variable` pattern.

use crate::http::Request;
use chrono::Local;
use std::time::Duration;

const TIME_LOCAL_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request, captured after the response was written
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    /// Request target without the query
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// `1.0`/`1.1`, or `0.9` for a bare request line
    pub http_version: String,
    pub status: u16,
    /// Body bytes written to the client
    pub bytes_sent: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (url.to_string(), None),
        };
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query,
            http_version: "0.9".to_string(),
            status: 200,
            bytes_sent: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Capture the request side of an entry
    pub fn from_request(remote_addr: String, request: &Request) -> Self {
        let mut entry = Self::new(remote_addr, request.method().to_string(), request.url());
        if let Some(version) = request.version() {
            entry.http_version = version.as_str().to_string();
        }
        entry.referer = request.header("Referer").map(str::to_string);
        entry.user_agent = request.header("User-Agent").map(str::to_string);
        entry
    }

    /// Record the outcome
    #[must_use]
    pub fn finish(mut self, status: u16, bytes_sent: u64, elapsed: Duration) -> Self {
        self.status = status;
        self.bytes_sent = bytes_sent;
        self.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.format_common(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(TIME_LOCAL_FORMAT),
            self.request_line(),
            self.status,
            self.bytes_sent,
        )
    }

    fn format_json(&self) -> String {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map_or_else(|| "null".to_string(), |v| format!("\"{}\"", escape_json(v)))
        };

        format!(
            r#"{{"remote_addr":"{}","time":"{}","method":"{}","path":"{}","query":{},"http_version":"{}","status":{},"bytes_sent":{},"referer":{},"user_agent":{},"request_time_us":{}}}"#,
            escape_json(&self.remote_addr),
            self.time.to_rfc3339(),
            escape_json(&self.method),
            escape_json(&self.path),
            optional(&self.query),
            self.http_version,
            self.status,
            self.bytes_sent,
            optional(&self.referer),
            optional(&self.user_agent),
            self.request_time_us,
        )
    }

    /// Substitute `$variable`s in `pattern`
    ///
    /// Variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$request_time`
    /// (seconds), `$status`, `$bytes_sent`, `$http_referer`,
    /// `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // Prefixes of other names ($request) must come after them
        let variables = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(TIME_LOCAL_FORMAT).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", self.request_uri()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$bytes_sent", self.bytes_sent.to_string()),
            (
                "$http_referer",
                self.referer.clone().unwrap_or_else(|| "-".to_string()),
            ),
            (
                "$http_user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];

        variables
            .iter()
            .fold(pattern.to_string(), |line, (name, value)| {
                line.replace(name, value)
            })
    }
}

fn escape_json(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\u{:04x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}
