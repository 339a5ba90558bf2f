//! Request accumulation and routing.
//!
//! A request is reduced to a verb and a path as soon as the CRLFCRLF header
//! terminator is observed; nothing else in the head is inspected. Query
//! strings and bodies are not parsed, so any path carrying one falls through
//! to not-found.

/// The four terminal routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// `GET /` - HTML dashboard shell.
    Dashboard,
    /// `GET /api/current` - JSON snapshot of the bank.
    Current,
    /// `GET /api/history` - JSON replay of the persisted log.
    History,
    /// Everything else.
    NotFound,
}

/// Scan for the end-of-headers terminator. Returns the index just past
/// `\r\n\r\n` when present.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Match the request line against the fixed route table.
///
/// Paths are compared exactly; the router never prefix-matches, so
/// `/api/currently` is not-found rather than a snapshot.
pub fn route(head: &str) -> Route {
    let request_line = head.lines().next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    match (method, path) {
        ("GET", "/") => Route::Dashboard,
        ("GET", "/api/current") => Route::Current,
        ("GET", "/api/history") => Route::History,
        _ => Route::NotFound,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_end_detection() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\n"), Some(18));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n"), None);
        assert_eq!(find_header_end(b""), None);
    }

    #[test]
    fn test_header_end_mid_buffer() {
        let buf = b"GET / HTTP/1.1\r\nHost: x\r\n\r\ntrailing";
        assert_eq!(find_header_end(buf), Some(27));
    }

    #[test]
    fn test_known_routes() {
        assert_eq!(route("GET / HTTP/1.1\r\nHost: x\r\n"), Route::Dashboard);
        assert_eq!(route("GET /api/current HTTP/1.1\r\n"), Route::Current);
        assert_eq!(route("GET /api/history HTTP/1.1\r\n"), Route::History);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        assert_eq!(route("GET /unknown HTTP/1.1\r\n"), Route::NotFound);
        assert_eq!(route("GET /api HTTP/1.1\r\n"), Route::NotFound);
    }

    #[test]
    fn test_paths_match_exactly() {
        assert_eq!(route("GET /api/current2 HTTP/1.1\r\n"), Route::NotFound);
        assert_eq!(route("GET /api/history/1 HTTP/1.1\r\n"), Route::NotFound);
        assert_eq!(route("GET //  HTTP/1.1\r\n"), Route::NotFound);
    }

    #[test]
    fn test_non_get_methods_are_not_found() {
        assert_eq!(route("POST /api/current HTTP/1.1\r\n"), Route::NotFound);
        assert_eq!(route("HEAD / HTTP/1.1\r\n"), Route::NotFound);
    }

    #[test]
    fn test_garbage_request_line() {
        assert_eq!(route(""), Route::NotFound);
        assert_eq!(route("\r\n"), Route::NotFound);
        assert_eq!(route("GET"), Route::NotFound);
    }
}
