//! The accept loop: one thread per accepted connection.

use std::net::TcpListener;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use proxy_cache::Cache;
use signal_hook::consts::SIGPIPE;

use crate::worker;

/// Installs a process-wide SIGPIPE-ignore disposition.
///
/// Must be called before [`accept_loop`] starts: without it, a client
/// disconnecting mid-relay could deliver a terminating signal to the whole
/// process instead of surfacing as an ordinary write error on the one
/// worker thread handling that connection.
pub fn ignore_sigpipe() -> std::io::Result<()> {
    let delivered = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGPIPE, delivered)?;
    Ok(())
}

/// Accepts connections from `listener` forever, spawning one detached
/// worker thread per connection and returning immediately to accept the
/// next. A failed `accept` is logged and does not stop the loop.
pub fn accept_loop(listener: TcpListener, cache: Arc<Cache>) -> ! {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                tracing::debug!(%addr, "accepted connection");
                let cache = Arc::clone(&cache);
                thread::spawn(move || worker::handle_connection(stream, cache));
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to accept connection");
            }
        }
    }
}
