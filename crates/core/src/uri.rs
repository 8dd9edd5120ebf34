//! Absolute-URI tokenizer.
//!
//! A forward proxy receives request targets in absolute form
//! (`GET http://host:port/path HTTP/1.0`), unlike an origin server which
//! only ever sees the path. This module pulls `host`, an optional `port`,
//! and `path` out of that target.

/// The pieces extracted from an absolute-form request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    /// The hostname or IP literal, without a port.
    pub host: String,
    /// The port, if one was explicitly present in the URI. A missing port
    /// is reported as `None`, not defaulted — the caller decides the
    /// default (80).
    pub port: Option<u16>,
    /// The absolute path (and query string, untouched) to request from the
    /// origin. Defaults to `/` if the URI carried none.
    pub path: String,
}

/// Parses an absolute-form URI such as `http://example.com:8080/a/b?c=1`.
///
/// Accepts a missing `http://` scheme as well, since some clients send bare
/// `host[:port]/path` targets; this matches the permissiveness of the
/// original tokenizer this crate substitutes for.
pub fn parse_absolute_uri(uri: &str) -> Result<ParsedUri, String> {
    let rest = uri
        .strip_prefix("http://")
        .or_else(|| uri.strip_prefix("HTTP://"))
        .unwrap_or(uri);

    if rest.is_empty() {
        return Err("empty uri".to_string());
    }

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    if authority.is_empty() {
        return Err("missing host".to_string());
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port_str)) => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {port_str}"))?;
            (host.to_string(), Some(port))
        }
        None => (authority.to_string(), None),
    };

    if host.is_empty() {
        return Err("missing host".to_string());
    }

    let path = if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    };

    Ok(ParsedUri { host, port, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_and_path() {
        let parsed = parse_absolute_uri("http://example.test:8080/a/b?c=1").unwrap();
        assert_eq!(parsed.host, "example.test");
        assert_eq!(parsed.port, Some(8080));
        assert_eq!(parsed.path, "/a/b?c=1");
    }

    #[test]
    fn missing_port_is_none_not_eighty() {
        let parsed = parse_absolute_uri("http://example.test/a").unwrap();
        assert_eq!(parsed.port, None);
    }

    #[test]
    fn missing_path_defaults_to_slash() {
        let parsed = parse_absolute_uri("http://example.test").unwrap();
        assert_eq!(parsed.path, "/");
    }

    #[test]
    fn scheme_is_optional() {
        let parsed = parse_absolute_uri("example.test:81/x").unwrap();
        assert_eq!(parsed.host, "example.test");
        assert_eq!(parsed.port, Some(81));
        assert_eq!(parsed.path, "/x");
    }

    #[test]
    fn rejects_empty_host() {
        assert!(parse_absolute_uri("http:///path").is_err());
    }
}
