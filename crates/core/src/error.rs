//! Error types for the caching proxy
//!
//! All errors are non-panicking and propagate via `Result`; only the cache's
//! own invariant violations (see `proxy-cache`) are treated as fatal, and
//! that is expressed as a panic at the point of detection, not through this
//! enum.

use thiserror::Error;

/// Errors a worker can encounter while servicing one client transaction.
///
/// Only [`ProxyError::MalformedRequest`] and [`ProxyError::UnsupportedMethod`]
/// produce an HTTP response to the client; every other variant is logged
/// and the connection is closed silently, with no `502`-style response —
/// the proxy has no way to distinguish "origin unreachable" from "origin
/// merely slow" cheaply enough to justify one.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The client's request line did not parse as `METHOD URI HTTP/1.x`.
    #[error("malformed request line")]
    MalformedRequest,

    /// The client used a method other than `GET`.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The absolute-URI request target did not parse.
    #[error("uri parse failed: {0}")]
    UriParse(String),

    /// Connecting to the origin server failed.
    #[error("upstream connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Reading from or writing to a socket failed after the connection was
    /// established.
    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),
}

impl ProxyError {
    /// Returns the HTTP status code this error should be rendered as, for
    /// the two client-protocol-error variants that produce a response at
    /// all. Returns `None` for every other variant, which close silently.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProxyError::MalformedRequest => Some(400),
            ProxyError::UnsupportedMethod(_) => Some(501),
            ProxyError::UriParse(_) | ProxyError::Connect(_) | ProxyError::Io(_) => None,
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(err)
    }
}

/// Result type alias using [`ProxyError`].
pub type Result<T> = std::result::Result<T, ProxyError>;
