//! HTTP responder core: request-line routing and response construction.
//!
//! The responder speaks a deliberately tiny subset of HTTP/1.1: one request
//! per connection, four fixed responses, `Connection: close` on everything.
//! The firmware's server task owns the socket; this module owns every byte
//! that goes over it.
//!
//! - `request`: header-terminator scan and `(method, path)` routing
//! - `response`: status/header constants and the JSON body builders
//! - `dashboard`: the static dashboard page with its polling script

pub mod dashboard;
pub mod request;
pub mod response;

pub use request::{Route, find_header_end, route};

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_surface() {
        // The firmware server drives exactly this surface
        assert_eq!(route("GET / HTTP/1.1\r\n"), Route::Dashboard);
        assert!(find_header_end(b"GET / HTTP/1.1\r\n\r\n").is_some());
        assert!(response::OK_JSON.ends_with("\r\n\r\n"));
    }
}
