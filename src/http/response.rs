//! HTTP response model and serialization
//!
//! Header-bearing responses always declare `HTTP/1.1` and close the
//! connection. Bare responses (HTTP/0.9) are the body alone.

use super::escape::HtmlEscaped;
use super::headers::HeaderMap;
use crate::error::ServeError;
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

/// Fixed emission order; anything not listed goes last, in insertion order
const HEADER_ORDER: [&str; 8] = [
    "Date",
    "Server",
    "Accept-Ranges",
    "Connection",
    "Content-Length",
    "Content-Range",
    "Content-Type",
    "Last-Modified",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    PartialContent,
    NotModified,
    BadRequest,
    Forbidden,
    NotFound,
    RangeNotSatisfiable,
    InternalServerError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::PartialContent => 206,
            Self::NotModified => 304,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::RangeNotSatisfiable => 416,
            Self::InternalServerError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::PartialContent => "Partial Content",
            Self::NotModified => "Not Modified",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::RangeNotSatisfiable => "Requested Range Not Satisfiable",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

/// Where the body bytes come from
#[derive(Debug)]
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    /// Window of an already opened file
    File {
        file: std::fs::File,
        start: u64,
        len: u64,
    },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Status line and headers precede the body
    Headers,
    /// HTTP/0.9 simple response: body only
    Bare,
}

#[derive(Debug)]
pub struct Response {
    status: Status,
    headers: HeaderMap,
    body: Body,
    framing: Framing,
}

impl Response {
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Empty,
            framing: Framing::Headers,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub const fn framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Drop the body but keep every header (HEAD requests)
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = Body::Empty;
        self
    }

    pub const fn status(&self) -> Status {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub const fn body_ref(&self) -> &Body {
        &self.body
    }

    pub const fn is_bare(&self) -> bool {
        matches!(self.framing, Framing::Bare)
    }

    /// Status line and header block, terminated by the blank line
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        for (name, value) in self.ordered_headers() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    fn ordered_headers(&self) -> Vec<(&str, &str)> {
        let mut headers: Vec<_> = self.headers.iter().collect();
        headers.sort_by_key(|(name, _)| {
            HEADER_ORDER
                .iter()
                .position(|known| known == name)
                .unwrap_or(HEADER_ORDER.len())
        });
        headers
    }

    /// Write the response and return the number of body bytes sent
    pub async fn write_to<W>(self, writer: &mut W) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        if self.framing == Framing::Headers {
            writer.write_all(&self.head_bytes()).await?;
        }

        let sent = match self.body {
            Body::Empty => 0,
            Body::Bytes(bytes) => {
                writer.write_all(&bytes).await?;
                bytes.len() as u64
            }
            Body::File { file, start, len } => {
                let mut file = tokio::fs::File::from_std(file);
                file.seek(SeekFrom::Start(start)).await?;
                let mut window = file.take(len);
                tokio::io::copy(&mut window, writer).await?
            }
        };

        writer.flush().await?;
        Ok(sent)
    }
}

/// Error page shared by every rejection path
pub fn error_page(error: &ServeError, footer: &str) -> String {
    let status = error.status();
    format!(
        "<html><head><title>{} {}</title></head><body>\n\
        <h1>{}</h1>\n\
        {}\n\
        <hr>\n\
        {}\n\
        </body></html>\n",
        status.code(),
        status.reason(),
        status.reason(),
        HtmlEscaped(&error.reason()),
        footer,
    )
}

/// Build the complete error response for `error`
pub fn build_error_response(error: &ServeError, footer: &str) -> Response {
    let status = error.status();
    if status == Status::RangeNotSatisfiable {
        return Response::new(status)
            .header("Accept-Ranges", "bytes")
            .header("Content-Length", "0");
    }

    let page = error_page(error, footer);
    Response::new(status)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", page.len().to_string())
        .header("Content-Type", "text/html; charset=UTF-8")
        .body(Body::Bytes(page.into_bytes()))
}
