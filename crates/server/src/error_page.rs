//! The fixed HTML error page a worker sends when it rejects a request
//! before ever contacting an origin server.

/// Renders a complete HTTP/1.0 response carrying the proxy's fixed error
/// page for `code`/`short`/`long`.
pub fn render(code: u16, short: &str, long: &str) -> Vec<u8> {
    let body = format!(
        "<!DOCTYPE html><html><head><title>Proxy Error</title></head>\
<body bgcolor=\"ffffff\"><h1>{code}: {short}</h1><p>{long}</p><hr />\
<em>The Web Proxy</em></body></html>"
    );
    let mut response = format!(
        "HTTP/1.0 {code} {short}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}

/// The short and long messages this proxy knows how to render, keyed by
/// status code. Unrecognized codes fall back to a generic message.
pub fn status_text(code: u16) -> (&'static str, &'static str) {
    match code {
        400 => (
            "Bad Request",
            "The proxy could not parse the request line.",
        ),
        501 => (
            "Not Implemented",
            "The proxy only implements the GET method.",
        ),
        _ => ("Error", "The proxy could not service this request."),
    }
}
