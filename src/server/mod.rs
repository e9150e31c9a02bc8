// Server module entry point
// Accept loop, listener setup and shutdown signalling

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

pub use listener::create_reusable_listener;
pub use signal::{start_signal_handler, SignalHandler};

use crate::handler::AppState;
use crate::logger;

/// Accept connections until shutdown is requested
///
/// After shutdown, waits up to `timeout` for in-flight connections to finish.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
    timeout: Duration,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&state),
                            timeout,
                            &active_connections,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = signals.shutdown.notified() => break,
        }
    }

    drop(listener);
    if !drain_connections(&active_connections, timeout).await {
        logger::log_warning(&format!(
            "{} connection(s) still open after {} seconds, closing",
            active_connections.load(Ordering::SeqCst),
            timeout.as_secs()
        ));
    }
    Ok(())
}

/// Wait until `active` reaches zero; `false` if `timeout` elapses first
async fn drain_connections(active: &AtomicUsize, timeout: Duration) -> bool {
    const POLL_INTERVAL: Duration = Duration::from_millis(10);
    let deadline = tokio::time::Instant::now() + timeout;
    while active.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    true
}
