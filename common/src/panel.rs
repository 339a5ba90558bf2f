//! Text for the 16x2 character display.
//!
//! The display shows one battery at a time; the firmware advances through
//! the bank one channel per refresh. Both lines are capped at the panel
//! width, formatting is fixed so the layout never jumps.

use core::fmt::Write;

use crate::battery::BatteryChannel;

/// One 16-character display row.
pub type PanelLine = heapless::String<16>;

/// Render the two rows for one battery:
/// `Bat3: 12.45V` over `87.27% OK`.
pub fn battery_lines(channel: &BatteryChannel) -> (PanelLine, PanelLine) {
    let mut top = PanelLine::new();
    let mut bottom = PanelLine::new();
    let _ = write!(top, "Bat{}: {:.2}V", channel.id + 1, channel.voltage);
    let _ = write!(
        bottom,
        "{:.2}% {}",
        channel.percentage,
        if channel.healthy { "OK" } else { "LOW" }
    );
    (top, bottom)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: u8, raw: u16) -> BatteryChannel {
        let (voltage, percentage) = crate::convert::convert(raw);
        BatteryChannel {
            id,
            raw,
            voltage,
            percentage,
            healthy: percentage > crate::config::UNHEALTHY_PERCENT,
            last_update_ms: 0,
        }
    }

    #[test]
    fn test_healthy_battery_lines() {
        let (top, bottom) = battery_lines(&channel(2, 1000));
        assert_eq!(top.as_str(), "Bat3: 11.73V");
        assert_eq!(bottom.as_str(), "67.05% OK");
    }

    #[test]
    fn test_low_battery_lines() {
        let (top, bottom) = battery_lines(&channel(0, 512));
        assert_eq!(top.as_str(), "Bat1: 6.01V");
        assert_eq!(bottom.as_str(), "0.00% LOW");
    }

    #[test]
    fn test_lines_fit_the_panel() {
        for raw in [0u16, 512, 894, 1023] {
            for id in [0u8, 9] {
                let (top, bottom) = battery_lines(&channel(id, raw));
                assert!(top.len() <= 16);
                assert!(bottom.len() <= 16);
            }
        }
    }
}
