//! Cache-specific error type.

use thiserror::Error;

/// A cache invariant was violated.
///
/// The only way to trigger this from outside the crate is to call
/// [`crate::CacheHandle::release`] twice, or to leak a handle past the point
/// where its entry was somehow freed while pinned (which the cache itself
/// never does). Per the error taxonomy this is a class 5 error: callers are
/// expected to treat it as unrecoverable and let the worker thread unwind.
#[derive(Debug, Error)]
pub enum CacheError {
    /// `release` was called for a URI whose pin count was already zero, or
    /// for a URI that is no longer present in the store.
    #[error("cache invariant violated: release of an unpinned entry (uri: {0})")]
    InvariantViolation(String),
}
