//! Cycling battery view for the character display.
//!
//! One battery is shown at a time; every refresh advances to the next
//! channel so the whole bank is visible over one sweep.

use battmon_common::battery::BatteryBank;
use battmon_common::panel;

use crate::lcd::Lcd1602;

pub struct DisplayView {
    current: usize,
}

impl DisplayView {
    pub const fn new() -> Self { Self { current: 0 } }

    /// Render the current channel and advance the cycle.
    pub fn render_next(
        &mut self,
        lcd: &mut Lcd1602,
        bank: &BatteryBank,
    ) {
        let channels = bank.channels();
        let (top, bottom) = panel::battery_lines(&channels[self.current]);
        lcd.print_lines(&top, &bottom);
        self.current = (self.current + 1) % channels.len();
    }
}
