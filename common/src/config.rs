//! Application configuration constants.
//!
//! All values are compile-time constants with validation assertions, so a
//! misconfigured threshold ordering fails the build instead of misclassifying
//! batteries at runtime.

// =============================================================================
// Battery Bank
// =============================================================================

/// Number of monitored battery channels.
pub const CHANNEL_COUNT: usize = 10;

/// Full-scale raw sample value (10-bit sample domain).
pub const SAMPLE_MAX_RAW: u16 = 1023;

/// Analog reference voltage of the sampling front-end, in volts.
pub const ADC_REF_VOLTAGE: f32 = 5.0;

/// Maximum battery voltage being monitored, in volts.
pub const BATTERY_VOLTAGE_MAX: f32 = 12.0;

/// Fraction of [`BATTERY_VOLTAGE_MAX`] treated as 0% state of charge
/// (10.0 V for a 12 V battery).
pub const PERCENT_FLOOR_RATIO: f32 = 0.83;

/// Fraction of [`BATTERY_VOLTAGE_MAX`] treated as 100% state of charge
/// (12.6 V for a 12 V battery).
pub const PERCENT_CEIL_RATIO: f32 = 1.05;

/// Percentage at or below which a battery is reported unhealthy.
pub const UNHEALTHY_PERCENT: f32 = 20.0;

// Thresholds must describe a non-empty percentage window
const _: () = assert!(PERCENT_FLOOR_RATIO < PERCENT_CEIL_RATIO);
const _: () = assert!(UNHEALTHY_PERCENT > 0.0 && UNHEALTHY_PERCENT < 100.0);

// =============================================================================
// Scheduler Cadences
// =============================================================================

/// LCD refresh period in milliseconds.
pub const DISPLAY_UPDATE_MS: u32 = 2_000;

/// CSV log append period in milliseconds.
pub const LOG_INTERVAL_MS: u32 = 60_000;

/// Status LED blink half-period while any battery is unhealthy.
pub const LED_BLINK_MS: u32 = 500;

/// Cooperative yield at the end of each scheduler pass.
pub const LOOP_YIELD_MS: u64 = 100;

// =============================================================================
// Time
// =============================================================================

/// Fixed local timezone offset from UTC, in seconds (UTC-4).
pub const TIMEZONE_OFFSET_SECS: i64 = -4 * 3600;

/// NTP server queried for wall-clock time.
pub const NTP_SERVER: &str = "pool.ntp.org";

/// Interval between fire-and-forget re-synchronizations, in seconds.
pub const NTP_SYNC_INTERVAL_SECS: u64 = 3_600;

/// Bounded number of sync attempts at startup before degrading to
/// unsynced operation.
pub const NTP_STARTUP_ATTEMPTS: u32 = 10;

/// Delay between startup sync attempts, in milliseconds.
pub const NTP_RETRY_DELAY_MS: u64 = 1_000;

// =============================================================================
// Storage + HTTP
// =============================================================================

/// Log file name on the SD card.
pub const LOG_FILE: &str = "battery.csv";

/// Maximum length of one serialized CSV data line, including the newline.
pub const LOG_LINE_MAX: usize = 256;

/// TCP port the HTTP responder listens on.
pub const HTTP_PORT: u16 = 80;

/// Upper bound on a buffered HTTP request head. Reading stops here even if
/// the terminator never arrived; the request line has long since fit.
pub const MAX_REQUEST_HEAD: usize = 512;
