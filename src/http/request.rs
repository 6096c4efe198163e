//! Request head parsing
//!
//! Accepts `\n` and `\r\n` line endings interchangeably. A request line
//! without a version token is an HTTP/0.9 simple request.

use super::headers::HeaderMap;
use crate::error::ServeError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    /// Anything else, kept so the rejection can name it
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            _ => Self::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    fn parse(token: &str) -> Result<Self, ServeError> {
        match token.to_ascii_uppercase().as_str() {
            "HTTP/1.0" => Ok(Self::Http10),
            "HTTP/1.1" => Ok(Self::Http11),
            _ => Err(ServeError::MalformedRequest(format!(
                "unsupported HTTP version {token}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http10 => "1.0",
            Self::Http11 => "1.1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    version: Option<Version>,
    headers: HeaderMap,
}

impl Request {
    /// Parse a request head (request line plus header lines, up to and
    /// including the blank line, if any)
    pub fn parse(head: &[u8]) -> Result<Self, ServeError> {
        let text = std::str::from_utf8(head)
            .map_err(|_| ServeError::MalformedRequest("invalid UTF-8 in request".to_string()))?;

        let mut lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let request_line = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or_else(|| ServeError::MalformedRequest("empty request".to_string()))?;

        let (method, url, version) = parse_request_line(request_line)?;

        let mut headers = HeaderMap::new();
        if version.is_some() {
            for line in lines.take_while(|line| !line.is_empty()) {
                let (name, value) = parse_header(line)?;
                headers.insert(name, value);
            }
        }

        Ok(Self {
            method,
            url,
            version,
            headers,
        })
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Raw request target as sent, query string included
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request target without its query string
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(path, _)| path)
    }

    pub const fn version(&self) -> Option<Version> {
        self.version
    }

    /// True for HTTP/0.9 simple requests, which get a bare body back
    pub const fn is_bare(&self) -> bool {
        self.version.is_none()
    }

    pub const fn is_head(&self) -> bool {
        matches!(self.method, Method::Head)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// True when a request line carries no version token
pub fn is_simple_request_line(line: &[u8]) -> bool {
    let line = String::from_utf8_lossy(line);
    line.split_ascii_whitespace().count() < 3
}

fn parse_request_line(line: &str) -> Result<(Method, String, Option<Version>), ServeError> {
    let mut tokens = line.split_ascii_whitespace();
    let (Some(method), Some(url)) = (tokens.next(), tokens.next()) else {
        return Err(ServeError::MalformedRequest(format!(
            "malformed request line `{line}`"
        )));
    };
    let version = tokens.next().map(Version::parse).transpose()?;
    if tokens.next().is_some() {
        return Err(ServeError::MalformedRequest(format!(
            "malformed request line `{line}`"
        )));
    }
    Ok((Method::parse(method), url.to_string(), version))
}

fn parse_header(line: &str) -> Result<(String, String), ServeError> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(ServeError::MalformedRequest(format!(
            "header line without colon `{line}`"
        )));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ServeError::MalformedRequest("empty header name".to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
