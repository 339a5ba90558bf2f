//! Analog acquisition through a 16-channel mux.
//!
//! The ten battery dividers feed a CD74HC4067 whose output drives a single
//! ADC input; four GPIO lines select the active channel. The RP2350 ADC is
//! 12-bit, scaled down to the 10-bit sample domain the conversion pipeline
//! expects.

use embassy_rp::adc::{self, Adc};
use embassy_rp::gpio::{Level, Output};

use battmon_common::battery::SampleSource;

/// Cycles to let the mux output and ADC sample capacitor settle after a
/// channel switch (a few microseconds at 150 MHz).
const SETTLE_CYCLES: u32 = 600;

pub struct MuxSampler {
    adc: Adc<'static, adc::Blocking>,
    input: adc::Channel<'static>,
    select: [Output<'static>; 4],
}

impl MuxSampler {
    pub fn new(
        adc: Adc<'static, adc::Blocking>,
        input: adc::Channel<'static>,
        select: [Output<'static>; 4],
    ) -> Self {
        Self { adc, input, select }
    }

    fn select_channel(
        &mut self,
        channel: usize,
    ) {
        for (bit, line) in self.select.iter_mut().enumerate() {
            let level = if channel >> bit & 1 == 1 { Level::High } else { Level::Low };
            line.set_level(level);
        }
        cortex_m::asm::delay(SETTLE_CYCLES);
    }
}

impl SampleSource for MuxSampler {
    fn read(
        &mut self,
        channel: usize,
    ) -> u16 {
        self.select_channel(channel);
        match self.adc.blocking_read(&mut self.input) {
            // 12-bit reading into the 10-bit sample range
            Ok(raw) => raw >> 2,
            Err(_) => 0,
        }
    }
}
