//! Buffered line-oriented reads and whole-buffer writes over a socket.
//!
//! A line reader that yields one CRLF-terminated line per call, and a writer
//! that tolerates partial progress. Deliberately thin — the proxy's own
//! parsing logic lives above this, not in here.

use std::io::{self, BufRead, BufReader, Read, Write};

/// Wraps a byte stream with a bounded line reader.
///
/// `R` is generic so tests can drive it with an in-memory cursor instead of
/// a real socket.
pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line: usize,
}

impl<R: Read> LineReader<R> {
    /// Wraps `stream`, capping any single line at `max_line` bytes.
    pub fn new(stream: R, max_line: usize) -> Self {
        Self {
            inner: BufReader::new(stream),
            max_line,
        }
    }

    /// Reads one line, including its trailing `\n` (and `\r` if present).
    ///
    /// Returns an empty `Vec` on EOF (mirrors `rio_readlineb` returning 0).
    /// Returns `Err` if the line exceeds `max_line` bytes before a `\n` is
    /// seen, or on any underlying I/O failure.
    pub fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                break; // EOF
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(idx) => {
                    line.extend_from_slice(&buf[..=idx]);
                    self.inner.consume(idx + 1);
                    break;
                }
                None => {
                    let len = buf.len();
                    line.extend_from_slice(buf);
                    self.inner.consume(len);
                }
            }
            if line.len() > self.max_line {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "request line exceeded maximum length",
                ));
            }
        }
        Ok(line)
    }

    /// Reads exactly `buf.len()` bytes, the whole-buffer counterpart to
    /// `read_line` for payloads of known length.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf)
    }

    /// Reads up to `buf.len()` bytes, returning the number read (0 on EOF).
    /// Used by the relay loop, which does not know the origin's response
    /// length in advance.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    /// Returns the underlying stream, consuming the reader. Any bytes
    /// already buffered but not yet consumed are discarded — callers must
    /// finish reading headers before switching to raw byte copying.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

/// Writes every byte in `buf` to `writer`, restarting on partial progress.
///
/// `std::io::Write::write_all` already implements exactly this contract;
/// this wrapper exists so the one call site that needs to tolerate
/// `BrokenPipe` without resurfacing a worse error lives in one spot.
pub fn write_all<W: Write>(writer: &mut W, buf: &[u8]) -> io::Result<()> {
    writer.write_all(buf)
}
