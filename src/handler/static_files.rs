//! Static file serving module
//!
//! Turns a resolved target plus the conditional and range outcomes into
//! a response. Size and modification time come from the single stat
//! made during resolution and are reused for every header.

use crate::config::ServeContext;
use crate::error::ServeError;
use crate::handler::listing;
use crate::http::conditional::{self, Conditional};
use crate::http::range::{ByteRange, RangeParseResult};
use crate::http::{Body, Response, Status};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Metadata captured when the target was resolved
#[derive(Debug, Clone, Copy)]
pub struct FileSnapshot<'a> {
    pub path: &'a Path,
    pub size: u64,
    pub modified: SystemTime,
}

/// Serve a generated index for `dir`
pub fn serve_directory(
    ctx: &ServeContext,
    dir: &Path,
    url_path: &str,
) -> Result<Response, ServeError> {
    let page = listing::render(dir, url_path, &ctx.footer())
        .map_err(|e| map_io_error(&e, url_path))?;

    Ok(Response::new(Status::Ok)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", page.len().to_string())
        .header("Content-Type", "text/html; charset=UTF-8")
        .body(Body::Bytes(page.into_bytes())))
}

/// Build the response for a regular file
///
/// `NotModified` wins over any range; an unsatisfiable range wins over
/// the full body. The file is only opened when a body will be sent.
pub fn serve_file(
    ctx: &ServeContext,
    file: FileSnapshot<'_>,
    conditional: Conditional,
    range: RangeParseResult,
    send_body: bool,
    url_path: &str,
) -> Result<Response, ServeError> {
    if conditional == Conditional::NotModified {
        return Ok(build_not_modified_response());
    }

    let content_type = ctx.mime().content_type(file.path);
    let last_modified = conditional::http_date(file.modified);

    match range {
        RangeParseResult::NotSatisfiable => Err(ServeError::RangeUnsatisfiable),
        RangeParseResult::Valid(window) => {
            let body = if send_body {
                open_window(file.path, window.start, window.content_length(), url_path)?
            } else {
                Body::Empty
            };
            Ok(build_partial_response(
                body,
                content_type,
                &last_modified,
                window,
                file.size,
            ))
        }
        RangeParseResult::None => {
            let body = if send_body {
                open_window(file.path, 0, file.size, url_path)?
            } else {
                Body::Empty
            };
            Ok(build_full_response(
                body,
                content_type,
                &last_modified,
                file.size,
            ))
        }
    }
}

/// 304: no validators or entity headers, ranges still advertised
pub fn build_not_modified_response() -> Response {
    Response::new(Status::NotModified).header("Accept-Ranges", "bytes")
}

/// 200 with the whole file
pub fn build_full_response(
    body: Body,
    content_type: &str,
    last_modified: &str,
    file_size: u64,
) -> Response {
    Response::new(Status::Ok)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", file_size.to_string())
        .header("Content-Type", content_type)
        .header("Last-Modified", last_modified)
        .body(body)
}

/// 206 Partial Content response
pub fn build_partial_response(
    body: Body,
    content_type: &str,
    last_modified: &str,
    range: ByteRange,
    file_size: u64,
) -> Response {
    Response::new(Status::PartialContent)
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", range.content_length().to_string())
        .header("Content-Range", range.content_range(file_size))
        .header("Content-Type", content_type)
        .header("Last-Modified", last_modified)
        .body(body)
}

fn open_window(path: &Path, start: u64, len: u64, url_path: &str) -> Result<Body, ServeError> {
    let file = std::fs::File::open(path).map_err(|e| map_io_error(&e, url_path))?;
    Ok(Body::File { file, start, len })
}

fn map_io_error(error: &io::Error, url_path: &str) -> ServeError {
    match error.kind() {
        io::ErrorKind::NotFound => ServeError::NotFound(url_path.to_string()),
        io::ErrorKind::PermissionDenied => ServeError::Forbidden(url_path.to_string()),
        _ => ServeError::Internal(error.to_string()),
    }
}
