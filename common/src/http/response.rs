//! Fixed response heads and JSON body builders.
//!
//! Bodies are delimited by connection close, so no Content-Length is
//! emitted. JSON is assembled by hand into fixed-capacity strings; the
//! history body is produced one record at a time so the server can stream
//! an arbitrarily long log without buffering it.

use core::fmt::Write;

use heapless::String;

use crate::battery::BatteryBank;
use crate::clock::WallClock;
use crate::logfmt::LogRecord;
use crate::timefmt::{self, TimeFormat};

/// 200 response head for HTML bodies.
pub const OK_HTML: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// 200 response head for JSON bodies.
pub const OK_JSON: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n";

/// 404 response head.
pub const NOT_FOUND: &str =
    "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// 404 body.
pub const NOT_FOUND_HTML: &str = "<h1>404 - Not Found</h1>\n";

/// Opening of the history body; records are appended between head and tail.
pub const HISTORY_HEAD: &str = "{\"history\":[";

/// Closing of the history body.
pub const HISTORY_TAIL: &str = "]}\n";

/// Whole current-snapshot body (about 820 bytes for ten channels).
pub type SnapshotJson = String<1024>;

/// One history record chunk (about 540 bytes for ten channels).
pub type RecordJson = String<640>;

/// Build the `/api/current` body from the live bank and clock.
pub fn current_json(
    bank: &BatteryBank,
    clock: &WallClock,
    uptime_ms: u64,
    out: &mut SnapshotJson,
) {
    out.clear();
    let datetime = timefmt::format(clock, uptime_ms, TimeFormat::UsLocal);
    let _ = write!(
        out,
        "{{\"timestamp\":{},\"datetime\":\"{}\",\"batteries\":[",
        clock.epoch_utc(uptime_ms),
        datetime
    );
    for (i, channel) in bank.channels().iter().enumerate() {
        if i > 0 {
            let _ = out.push(',');
        }
        let _ = write!(
            out,
            "{{\"id\":{},\"raw\":{},\"voltage\":{:.3},\"percentage\":{:.1},\"healthy\":{}}}",
            channel.id + 1,
            channel.raw,
            channel.voltage,
            channel.percentage,
            channel.healthy
        );
    }
    let _ = out.push_str("]}\n");
}

/// Re-serialize one replayed log record as a history entry. `first` controls
/// the separating comma between entries.
pub fn history_record_json(
    record: &LogRecord,
    first: bool,
    out: &mut RecordJson,
) {
    out.clear();
    if !first {
        let _ = out.push(',');
    }
    let _ = write!(out, "{{\"timestamp\":\"{}\",\"data\":[", record.timestamp);
    for (i, channel) in record.channels.iter().enumerate() {
        if i > 0 {
            let _ = out.push(',');
        }
        let _ = write!(
            out,
            "{{\"raw\":{},\"voltage\":{:.3},\"percentage\":{:.1}}}",
            channel.raw, channel.voltage, channel.percentage
        );
    }
    let _ = out.push_str("]}");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::SampleSource;
    use crate::config::CHANNEL_COUNT;
    use crate::logfmt;

    struct FixedSource(u16);

    impl SampleSource for FixedSource {
        fn read(&mut self, _channel: usize) -> u16 { self.0 }
    }

    fn healthy_bank() -> BatteryBank {
        let mut bank = BatteryBank::new();
        bank.refresh_all(&mut FixedSource(1000), 0);
        bank
    }

    fn synced_clock() -> WallClock {
        let mut clock = WallClock::new();
        clock.set(1_700_000_000, 0);
        clock
    }

    #[test]
    fn test_response_heads_close_the_connection() {
        for head in [OK_HTML, OK_JSON, NOT_FOUND] {
            assert!(head.contains("Connection: close\r\n"));
            assert!(head.ends_with("\r\n\r\n"));
            assert!(!head.contains("Cache-Control"));
        }
    }

    #[test]
    fn test_not_found_is_html() {
        assert!(NOT_FOUND.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(NOT_FOUND.contains("Content-Type: text/html\r\n"));
        assert!(NOT_FOUND_HTML.contains("404"));
    }

    #[test]
    fn test_current_json_lists_every_channel() {
        let bank = healthy_bank();
        let clock = synced_clock();
        let mut body = SnapshotJson::new();
        current_json(&bank, &clock, 0, &mut body);

        assert!(body.starts_with("{\"timestamp\":1700000000,"));
        assert!(body.contains("\"datetime\":\"11/14/2023 6:13:20 PM\""));
        assert_eq!(body.matches("\"id\":").count(), CHANNEL_COUNT);
        assert_eq!(body.matches("\"healthy\":true").count(), CHANNEL_COUNT);
        assert!(body.contains("\"id\":1,"));
        assert!(body.contains("\"id\":10,"));
        assert!(body.trim_end().ends_with("]}"));
    }

    #[test]
    fn test_current_json_unsynced_clock() {
        let bank = healthy_bank();
        let clock = WallClock::new();
        let mut body = SnapshotJson::new();
        current_json(&bank, &clock, 0, &mut body);

        assert!(body.starts_with("{\"timestamp\":0,"));
        assert!(body.contains("\"datetime\":\"Time not synced\""));
    }

    #[test]
    fn test_current_json_reports_unhealthy_channels() {
        let mut bank = BatteryBank::new();
        bank.refresh_all(&mut FixedSource(512), 0);
        let mut body = SnapshotJson::new();
        current_json(&bank, &synced_clock(), 0, &mut body);
        assert_eq!(body.matches("\"healthy\":false").count(), CHANNEL_COUNT);
    }

    #[test]
    fn test_history_record_chunks_concatenate() {
        let bank = healthy_bank();
        let record = logfmt::record_from_bank(&bank, "2023-11-14T22:13:20Z");

        let mut first = RecordJson::new();
        let mut second = RecordJson::new();
        history_record_json(&record, true, &mut first);
        history_record_json(&record, false, &mut second);

        assert!(first.starts_with("{\"timestamp\":\"2023-11-14T22:13:20Z\",\"data\":["));
        assert!(second.starts_with(",{\"timestamp\":"));
        assert_eq!(first.matches("\"raw\":").count(), CHANNEL_COUNT);
        assert!(first.ends_with("]}"));

        // Assembled body is the head, the chunks, and the tail
        let mut body = std::string::String::new();
        body.push_str(HISTORY_HEAD);
        body.push_str(&first);
        body.push_str(&second);
        body.push_str(HISTORY_TAIL);
        assert!(body.starts_with("{\"history\":[{"));
        assert!(body.ends_with("]}]}\n"));
    }

    #[test]
    fn test_empty_history_is_head_plus_tail() {
        let mut body = std::string::String::new();
        body.push_str(HISTORY_HEAD);
        body.push_str(HISTORY_TAIL);
        assert_eq!(body, "{\"history\":[]}\n");
    }

    #[test]
    fn test_round_trip_log_line_to_history_entry() {
        let bank = healthy_bank();
        let record = logfmt::record_from_bank(&bank, "2023-11-14T22:13:20Z");
        let line = logfmt::serialize(&record);
        let replayed = logfmt::parse_line(&line).expect("valid line");

        let mut chunk = RecordJson::new();
        history_record_json(&replayed, true, &mut chunk);
        let voltage = crate::convert::convert(1000).0;
        let mut expected = std::string::String::new();
        use core::fmt::Write as _;
        let _ = write!(expected, "\"voltage\":{voltage:.3}");
        assert!(chunk.contains(expected.as_str()));
    }
}
