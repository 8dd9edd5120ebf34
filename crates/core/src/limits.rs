//! Cache and line-buffer size limits.

/// Maximum size of a single cached response body, in bytes (100 KiB).
///
/// A response larger than this is still relayed to the client in full; it is
/// simply never stored.
pub const MAX_OBJECT_SIZE: usize = 100 * 1024;

/// Maximum total size of all cached response bodies, in bytes (1 MiB).
pub const MAX_CACHE_SIZE: usize = 1024 * 1024;

/// Maximum length of a single request/header line read from a client or an
/// origin server.
pub const MAXLINE: usize = 8 * 1024;
