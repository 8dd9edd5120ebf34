//! Caching HTTP/1.0 forward proxy.
//!
//! # Usage
//! ```bash
//! proxy <port>
//! ```

use std::net::TcpListener;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use proxy_cache::Cache;

/// A caching HTTP/1.0 forward proxy.
#[derive(Parser, Debug)]
#[command(name = "proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port to listen on.
    port: u16,
}

fn main() -> Result<()> {
    init_logging();

    // `try_parse` rather than `parse`: argument errors should exit 1, not
    // clap's own default of 2.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    tracing::info!("proxy v{}", env!("CARGO_PKG_VERSION"));

    proxy_server::ignore_sigpipe().context("failed to install SIGPIPE disposition")?;

    let listener = TcpListener::bind(("0.0.0.0", args.port))
        .with_context(|| format!("failed to listen on port {}", args.port))?;

    tracing::info!(port = args.port, "accepting connections");

    let cache = Cache::new();
    proxy_server::accept_loop(listener, cache);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
