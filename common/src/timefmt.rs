//! Epoch-to-civil conversion and the fixed time string layouts.
//!
//! Four layouts are produced, each with a fixed shape so downstream
//! consumers (CSV columns, the JSON API, the LCD) never see a varying
//! format:
//!
//! - [`TimeFormat::Utc`]: `YYYY-MM-DD HH:MM:SS UTC`
//! - [`TimeFormat::Local`]: `YYYY-MM-DD HH:MM:SS`, shifted by the configured
//!   fixed offset
//! - [`TimeFormat::UsLocal`]: `MM/DD/YYYY H:MM:SS AM|PM`, 12-hour with no
//!   leading zero on the hour
//! - [`TimeFormat::CsvIso`]: `YYYY-MM-DDTHH:MM:SSZ`
//!
//! Before the first sync the human-readable layouts render
//! [`UNSYNCED_TEXT`]; `CsvIso` renders the epoch sentinel instead so logged
//! rows stay well-formed.

use core::fmt::Write;

use crate::clock::WallClock;
use crate::config::TIMEZONE_OFFSET_SECS;

/// Sentinel for human-readable layouts before the first sync.
pub const UNSYNCED_TEXT: &str = "Time not synced";

/// Sentinel for the CSV layout before the first sync.
pub const EPOCH_SENTINEL: &str = "1970-01-01T00:00:00Z";

/// Longest layout is `YYYY-MM-DD HH:MM:SS UTC` (23 chars).
pub type TimeString = heapless::String<24>;

/// Broken-down UTC or local date and time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CivilDateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Gregorian date from a day count relative to 1970-01-01.
const fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year_of_era = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = if month <= 2 { year_of_era + 1 } else { year_of_era };
    (year, month, day)
}

/// Break an epoch (seconds, possibly offset-shifted) into civil fields.
pub fn civil_from_epoch(epoch: i64) -> CivilDateTime {
    let days = epoch.div_euclid(86_400);
    let second_of_day = epoch.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    CivilDateTime {
        year: year as i32,
        month,
        day,
        hour: (second_of_day / 3600) as u8,
        minute: (second_of_day % 3600 / 60) as u8,
        second: (second_of_day % 60) as u8,
    }
}

/// Available string layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFormat {
    Utc,
    Local,
    UsLocal,
    CsvIso,
}

/// Render the current time in the requested layout, falling back to the
/// layout's sentinel while unsynced.
pub fn format(
    clock: &WallClock,
    uptime_ms: u64,
    kind: TimeFormat,
) -> TimeString {
    let mut out = TimeString::new();

    if !clock.is_synced() {
        let sentinel = match kind {
            TimeFormat::CsvIso => EPOCH_SENTINEL,
            _ => UNSYNCED_TEXT,
        };
        let _ = out.push_str(sentinel);
        return out;
    }

    let epoch = clock.epoch_utc(uptime_ms) as i64;
    match kind {
        TimeFormat::Utc => {
            let t = civil_from_epoch(epoch);
            let _ = write!(
                out,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
                t.year, t.month, t.day, t.hour, t.minute, t.second
            );
        }
        TimeFormat::Local => {
            let t = civil_from_epoch(epoch + TIMEZONE_OFFSET_SECS);
            let _ = write!(
                out,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                t.year, t.month, t.day, t.hour, t.minute, t.second
            );
        }
        TimeFormat::UsLocal => {
            let t = civil_from_epoch(epoch + TIMEZONE_OFFSET_SECS);
            let (hour12, meridiem) = to_12_hour(t.hour);
            let _ = write!(
                out,
                "{:02}/{:02}/{:04} {}:{:02}:{:02} {}",
                t.month, t.day, t.year, hour12, t.minute, t.second, meridiem
            );
        }
        TimeFormat::CsvIso => {
            let t = civil_from_epoch(epoch);
            let _ = write!(
                out,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
                t.year, t.month, t.day, t.hour, t.minute, t.second
            );
        }
    }
    out
}

/// 12-hour clock conversion. Midnight and noon both display as 12.
const fn to_12_hour(hour: u8) -> (u8, &'static str) {
    match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
