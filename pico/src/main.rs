//! Battery Bank Monitor Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Samples ten battery channels through an analog mux, shows a cycling
//! per-battery view on a 16x2 I2C LCD, drives red/green status LEDs, appends
//! minute-resolution CSV records to SD, serves a dashboard and JSON API over
//! W5500 ethernet, and keeps wall-clock time with SNTP.
//!
//! All board-specific code lives here; the measurement, formatting, routing,
//! and scheduling logic is in `battmon-common` where it runs under the host
//! test harness.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]
// Crate-level lints (match battmon-common for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

// Embedded-only modules; none of them have meaning off-target.
#[cfg(target_arch = "arm")]
mod app;
#[cfg(target_arch = "arm")]
mod display;
#[cfg(target_arch = "arm")]
mod lcd;
#[cfg(target_arch = "arm")]
mod net;
#[cfg(target_arch = "arm")]
mod sampling;
#[cfg(target_arch = "arm")]
mod sdlog;
#[cfg(target_arch = "arm")]
mod server;
#[cfg(target_arch = "arm")]
mod sntp;

/// Placeholder entry for non-ARM builds (host tooling, tests).
#[cfg(not(target_arch = "arm"))]
fn main() {
    eprintln!("battmon is RP2350 firmware; build with --target thumbv8m.main-none-eabihf");
}
