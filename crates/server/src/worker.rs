//! Services exactly one client transaction on one socket, then closes it.

use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use proxy_cache::{Cache, CacheHandle};
use proxy_core::{lineio, uri, MAXLINE, MAX_OBJECT_SIZE};
use proxy_core::{ProxyError, Result};

use crate::error_page;
use crate::upstream::build_upstream_request;

const RELAY_BUFFER_SIZE: usize = 8 * 1024;

/// Read/write deadline applied to both the client and origin sockets.
///
/// No correctness property depends on this; it exists purely so a stalled
/// peer cannot pin a worker thread forever.
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

fn apply_timeouts(stream: &TcpStream) {
    let _ = stream.set_read_timeout(Some(SOCKET_TIMEOUT));
    let _ = stream.set_write_timeout(Some(SOCKET_TIMEOUT));
}

/// Handles one accepted connection end to end: parses the request, serves
/// it from cache or fetches it from the origin, and closes the socket.
///
/// Never panics except when a cache invariant is violated (see
/// [`release_or_panic`]), by design — that is the one error class this
/// worker treats as fatal to its own thread rather than recoverable.
pub fn handle_connection(stream: TcpStream, cache: Arc<Cache>) {
    let peer = stream.peer_addr().ok();
    let error_writer = stream.try_clone();

    match run(stream, &cache) {
        Ok(()) => {}
        Err(err) => {
            if let Some(code) = err.status_code() {
                tracing::warn!(?peer, error = %err, "rejected request");
                if let Ok(mut writer) = error_writer {
                    let (short, long) = error_page::status_text(code);
                    let page = error_page::render(code, short, long);
                    if let Err(write_err) = lineio::write_all(&mut writer, &page) {
                        tracing::warn!(?peer, error = %write_err, "failed to write error page");
                    }
                }
            } else {
                tracing::warn!(?peer, error = %err, "connection terminated");
            }
        }
    }
}

fn run(stream: TcpStream, cache: &Arc<Cache>) -> Result<()> {
    apply_timeouts(&stream);
    let mut writer = stream.try_clone()?;
    let mut reader = lineio::LineReader::new(stream, MAXLINE);

    let line = reader.read_line()?;
    if line.is_empty() {
        return Ok(());
    }

    let (method, uri_text, _version) =
        parse_request_line(&line).ok_or(ProxyError::MalformedRequest)?;
    if method != "GET" {
        return Err(ProxyError::UnsupportedMethod(method));
    }

    if let Some(handle) = cache.lookup(&uri_text) {
        let write_result = lineio::write_all(&mut writer, handle.body());
        release_or_panic(handle);
        write_result?;
        return Ok(());
    }

    let mut header_lines = Vec::new();
    loop {
        let raw = reader.read_line()?;
        if raw.is_empty() || raw == b"\r\n" {
            break;
        }
        header_lines.push(raw);
    }

    let parsed = uri::parse_absolute_uri(&uri_text).map_err(ProxyError::UriParse)?;
    let port = parsed.port.unwrap_or(80);
    let request = build_upstream_request(&parsed.host, &parsed.path, &header_lines);

    let mut origin =
        TcpStream::connect((parsed.host.as_str(), port)).map_err(ProxyError::Connect)?;
    apply_timeouts(&origin);
    lineio::write_all(&mut origin, &request)?;

    let mut candidate = Vec::new();
    let mut total = 0usize;
    let mut buf = [0u8; RELAY_BUFFER_SIZE];
    loop {
        let n = origin.read(&mut buf)?;
        if n == 0 {
            break;
        }
        lineio::write_all(&mut writer, &buf[..n])?;
        if total < MAX_OBJECT_SIZE {
            let take = n.min(MAX_OBJECT_SIZE - total);
            candidate.extend_from_slice(&buf[..take]);
        }
        total += n;
    }
    drop(origin);

    if total <= MAX_OBJECT_SIZE {
        match cache.lookup(&uri_text) {
            Some(handle) => release_or_panic(handle),
            None => cache.insert(uri_text, candidate),
        }
    } else {
        tracing::debug!(uri = %uri_text, total, "response exceeded the cacheable size, not stored");
    }

    Ok(())
}

/// Releases a pinned handle, treating a release failure as the fatal cache
/// invariant violation it is (error class 5): logged, then a panic that
/// unwinds only this worker's thread.
fn release_or_panic(handle: CacheHandle) {
    if let Err(err) = handle.release() {
        tracing::error!(error = %err, "cache invariant violated");
        panic!("cache invariant violated: {err}");
    }
}

/// Tokenizes a request line as `METHOD URI HTTP/1.<digit>`.
///
/// Returns `None` for anything else, including a version digit other than
/// `0` or `1`, or stray trailing tokens.
fn parse_request_line(line: &[u8]) -> Option<(String, String, char)> {
    let text = std::str::from_utf8(line).ok()?;
    let trimmed = text.trim_end_matches(['\r', '\n']);
    let mut parts = trimmed.split_whitespace();

    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let digit_str = version.strip_prefix("HTTP/1.")?;
    let mut digits = digit_str.chars();
    let digit = digits.next()?;
    if digits.next().is_some() || (digit != '0' && digit != '1') {
        return None;
    }

    Some((method.to_string(), target.to_string(), digit))
}
