//! Per-connection worker, upstream request builder, error page renderer,
//! and the accept loop that ties them to a shared cache.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod acceptor;
pub mod error_page;
pub mod upstream;
pub mod worker;

pub use acceptor::{accept_loop, ignore_sigpipe};
pub use worker::handle_connection;
