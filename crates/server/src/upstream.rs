//! Rewrites a client's request into the fixed HTTP/1.0 upstream request.

const USER_AGENT_LINE: &str =
    "User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:3.10.0) Gecko/20191101 Firefox/63.0.1\r\n";

/// Builds the complete upstream request byte string for `path` on `host`,
/// given the client's raw header lines (each including its trailing CRLF,
/// the terminating blank line excluded).
///
/// `Host`, `Connection`, `Proxy-Connection` and `User-Agent` are recognized
/// by case-sensitive substring match on the bare key (no trailing colon —
/// a header like `Hostname: x` is recognized as `Host` too, matching
/// `strstr`'s behavior on an unanchored substring) and replaced with the
/// fixed values below; every other client header is carried through
/// verbatim, in the order it was received.
pub fn build_upstream_request(host: &str, path: &str, header_lines: &[Vec<u8>]) -> Vec<u8> {
    let mut request = Vec::new();
    request.extend_from_slice(format!("GET {path} HTTP/1.0\r\n").as_bytes());

    match header_lines.iter().find(|line| contains(line, b"Host")) {
        Some(line) => request.extend_from_slice(line),
        None => request.extend_from_slice(format!("Host: {host}\r\n").as_bytes()),
    }

    request.extend_from_slice(b"Connection: close\r\n");
    request.extend_from_slice(b"Proxy-Connection: close\r\n");
    request.extend_from_slice(USER_AGENT_LINE.as_bytes());

    for line in header_lines {
        if contains(line, b"Host")
            || contains(line, b"Connection")
            || contains(line, b"Proxy-Connection")
            || contains(line, b"User-Agent")
        {
            continue;
        }
        request.extend_from_slice(line);
    }

    request.extend_from_slice(b"\r\n");
    request
}

fn contains(line: &[u8], needle: &[u8]) -> bool {
    line.windows(needle.len()).any(|window| window == needle)
}
