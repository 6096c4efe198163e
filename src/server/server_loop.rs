// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `state.shutdown` fires
///
/// After the listener closes, open connections get up to the larger of
/// the read and write timeouts to complete.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = state.shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_server_stop(state.active_connections.load(Ordering::SeqCst));

    let grace = Duration::from_secs(std::cmp::max(
        state.config.performance.read_timeout,
        state.config.performance.write_timeout,
    ));
    drain_connections(&state, grace).await;
    Ok(())
}

async fn drain_connections(state: &AppState, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    while state.active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Drain deadline passed with {} connection(s) open",
                state.active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
