//! Connection handling module
//!
//! One request per connection: read the head, answer it, close. The
//! request is resolved on the blocking pool since resolution, listing and
//! conditional checks all touch the filesystem synchronously.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::config::{AppState, Config, ServeContext};
use crate::error::ServeError;
use crate::handler;
use crate::http::request::{is_simple_request_line, Request};
use crate::logger::{self, AccessLogEntry};

/// Per-connection bounds taken from `[performance]` and `[http]`
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub max_request_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl ConnectionLimits {
    pub const fn from_config(config: &Config) -> Self {
        Self {
            max_request_size: config.http.max_request_size,
            read_timeout: Duration::from_secs(config.performance.read_timeout),
            write_timeout: Duration::from_secs(config.performance.write_timeout),
        }
    }
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self {
            max_request_size: 8192,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RequestHead {
    Complete(Vec<u8>),
    TooLarge,
    /// Peer closed before sending anything
    Closed,
}

/// Read up to the blank line ending the head, or only the request line
/// when it carries no version token
async fn read_request_head<R>(reader: &mut R, max_size: usize) -> io::Result<RequestHead>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::new();
    loop {
        let start = head.len();
        let remaining = max_size.saturating_add(1).saturating_sub(start) as u64;
        let read = (&mut *reader)
            .take(remaining)
            .read_until(b'\n', &mut head)
            .await?;

        if head.len() > max_size {
            return Ok(RequestHead::TooLarge);
        }
        if read == 0 {
            return Ok(if head.is_empty() {
                RequestHead::Closed
            } else {
                RequestHead::Complete(head)
            });
        }

        let line = &head[start..];
        if !line.ends_with(b"\n") {
            // EOF mid-line
            return Ok(RequestHead::Complete(head));
        }
        let finished = if start == 0 {
            is_simple_request_line(line)
        } else {
            line == b"\n" || line == b"\r\n"
        };
        if finished {
            return Ok(RequestHead::Complete(head));
        }
    }
}

/// Serve exactly one request on `stream`
///
/// Returns the access log entry for the exchange, or `None` when the
/// peer sent nothing before closing or timing out.
pub async fn serve_connection<S>(
    stream: S,
    ctx: Arc<ServeContext>,
    limits: ConnectionLimits,
    remote_addr: String,
) -> io::Result<Option<AccessLogEntry>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();
    let mut stream = BufReader::new(stream);

    let head = match tokio::time::timeout(
        limits.read_timeout,
        read_request_head(&mut stream, limits.max_request_size),
    )
    .await
    {
        Ok(head) => head?,
        Err(_) => {
            logger::log_debug(&format!("Read timeout from {remote_addr}"));
            return Ok(None);
        }
    };

    let (response, entry) = match head {
        RequestHead::Closed => return Ok(None),
        RequestHead::TooLarge => {
            let error = ServeError::MalformedRequest(format!(
                "request head exceeds {} bytes",
                limits.max_request_size
            ));
            logger::log_warning(&format!("{remote_addr}: {error}"));
            (
                handler::reject(&error, &ctx),
                AccessLogEntry::new(remote_addr, "-".to_string(), "-"),
            )
        }
        RequestHead::Complete(bytes) => match Request::parse(&bytes) {
            Ok(request) => {
                let entry = AccessLogEntry::from_request(remote_addr, &request);
                let ctx = Arc::clone(&ctx);
                let response =
                    tokio::task::spawn_blocking(move || handler::handle_request(&request, &ctx))
                        .await
                        .map_err(io::Error::other)?;
                (response, entry)
            }
            Err(error) => {
                logger::log_debug(&format!("{remote_addr}: {error}"));
                (
                    handler::reject(&error, &ctx),
                    AccessLogEntry::new(remote_addr, "-".to_string(), "-"),
                )
            }
        },
    };

    let status = response.status().code();
    let writer = stream.get_mut();
    let sent = tokio::time::timeout(limits.write_timeout, response.write_to(writer))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "response write timed out"))??;
    // The peer may already be gone; the response is complete either way
    let _ = writer.shutdown().await;

    Ok(Some(entry.finish(status, sent, started.elapsed())))
}

/// Admit a freshly accepted connection and serve it on its own task
///
/// Connections beyond `performance.max_connections` are dropped
/// unanswered.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
) {
    // Increment first, then check, so concurrent accepts cannot overshoot
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    let state = Arc::clone(state);
    tokio::spawn(async move {
        let limits = ConnectionLimits::from_config(&state.config);
        let result = serve_connection(
            stream,
            Arc::clone(&state.context),
            limits,
            peer_addr.ip().to_string(),
        )
        .await;

        match result {
            Ok(Some(entry)) if state.config.logging.access_log => {
                logger::log_access(&entry, &state.config.logging.access_log_format);
            }
            Ok(_) => {}
            Err(e) => logger::log_connection_error(&peer_addr, &e),
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
