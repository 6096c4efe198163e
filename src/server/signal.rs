// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C elsewhere) request a graceful shutdown: the
// accept loop stops and in-flight connections are given time to finish.

use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Register shutdown signals and forward the first one to `state.shutdown`
///
/// Registration happens before returning so a failure surfaces at startup.
#[cfg(unix)]
pub fn start_signal_handler(state: Arc<AppState>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("[Signal] {name} received, shutting down"));
        // notify_one stores a permit if the loop is not waiting right now
        state.shutdown.notify_one();
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn start_signal_handler(state: Arc<AppState>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[Signal] Ctrl+C received, shutting down");
            state.shutdown.notify_one();
        }
    });
    Ok(())
}
