//! Request dispatch module
//!
//! Entry point for request processing: method validation, resolution,
//! and the per-protocol framing every response passes through.

use crate::config::ServeContext;
use crate::error::ServeError;
use crate::handler::resolver::{self, InvalidReason, ResolvedTarget};
use crate::handler::static_files::{self, FileSnapshot};
use crate::http::{self, conditional, Framing, Method, Request, Response};
use crate::logger;
use std::time::SystemTime;

/// Main entry point for request handling
///
/// Never fails: every rejection becomes an explicit error response.
pub fn handle_request(request: &Request, ctx: &ServeContext) -> Response {
    let response = match dispatch(request, ctx) {
        Ok(response) => response,
        Err(error) => {
            logger::log_debug(&format!(
                "{} {} rejected: {error}",
                request.method(),
                request.url()
            ));
            http::build_error_response(&error, &ctx.footer())
        }
    };

    if request.is_bare() {
        return finish_bare(response, request.is_head());
    }
    finish(response, request.is_head(), ctx)
}

/// Response for a request that could not be parsed at all
pub fn reject(error: &ServeError, ctx: &ServeContext) -> Response {
    finish(http::build_error_response(error, &ctx.footer()), false, ctx)
}

fn dispatch(request: &Request, ctx: &ServeContext) -> Result<Response, ServeError> {
    if let Method::Other(method) = request.method() {
        logger::log_warning(&format!("Method not allowed: {method}"));
        return Err(ServeError::UnsupportedMethod(method.clone()));
    }

    let url_path = request.path();
    match resolver::resolve(url_path, ctx.root()) {
        ResolvedTarget::Invalid(reason) => Err(invalid_target(reason, request.url())),
        ResolvedTarget::Directory(dir) => static_files::serve_directory(ctx, &dir, url_path),
        ResolvedTarget::File {
            path,
            size,
            modified,
        } => {
            let conditional = conditional::evaluate(request.header("If-Modified-Since"), modified);
            let range = http::parse_range_header(request.header("Range"), size);
            static_files::serve_file(
                ctx,
                FileSnapshot {
                    path: &path,
                    size,
                    modified,
                },
                conditional,
                range,
                !request.is_head(),
                url_path,
            )
        }
    }
}

fn invalid_target(reason: InvalidReason, url: &str) -> ServeError {
    match reason {
        InvalidReason::MissingLeadingSlash | InvalidReason::EmbeddedNul => {
            ServeError::InvalidUrl(url.to_string())
        }
        InvalidReason::EscapesRoot => {
            logger::log_warning(&format!("Path traversal attempt blocked: {url}"));
            ServeError::InvalidUrl(url.to_string())
        }
        InvalidReason::NotFound => ServeError::NotFound(url.to_string()),
        InvalidReason::NotRegular | InvalidReason::PermissionDenied => {
            ServeError::Forbidden(url.to_string())
        }
        InvalidReason::Io => ServeError::Internal(format!("could not stat {url}")),
    }
}

/// Add the headers every header-bearing response carries
fn finish(response: Response, is_head: bool, ctx: &ServeContext) -> Response {
    let response = response
        .header("Date", conditional::http_date(SystemTime::now()))
        .header("Server", ctx.server_name())
        .header("Connection", "close");
    if is_head {
        response.without_body()
    } else {
        response
    }
}

/// HTTP/0.9: only the body travels
fn finish_bare(response: Response, is_head: bool) -> Response {
    let response = response.framing(Framing::Bare);
    if is_head {
        response.without_body()
    } else {
        response
    }
}
