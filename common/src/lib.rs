//! Battery monitor library - testable modules for the battery bank monitor.
//!
//! This library contains the core logic that can be tested on the host machine.
//! The firmware binary (`battmon-pico`) uses this library and adds the
//! embedded-specific code: ADC sampling, LCD, ethernet, SD card, and the
//! scheduler loop.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p battmon-common
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod battery;
pub mod cadence;
pub mod clock;
pub mod config;
pub mod convert;
pub mod http;
pub mod indicator;
pub mod logfmt;
pub mod panel;
pub mod timefmt;
