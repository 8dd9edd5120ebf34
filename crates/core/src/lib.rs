//! Proxy Core - shared types and low-level collaborators
//!
//! This crate contains the pieces every other crate in the workspace depends
//! on: the error taxonomy, the two size limits that govern the cache, and the
//! thin line-I/O and URI-parsing helpers that stand in as the proxy's
//! low-level collaborators: a buffered line reader, a whole-buffer writer, a
//! connector, and a URI tokenizer.
//!
//! # Invariants
//!
//! 1. No panics on malformed network input — everything here returns `Result`.
//! 2. No hidden I/O beyond what the caller explicitly asked for.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod limits;
pub mod lineio;
pub mod uri;

pub use error::{ProxyError, Result};
pub use limits::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE, MAXLINE};
