//! Firmware entry: peripheral bring-up, task spawning, and the scheduler.
//!
//! The main task is the cooperative scheduler. Every pass it samples all
//! channels, then runs the display, indicator, and log duties on their own
//! cadences, and yields. Network work (stack runner, SNTP resync, HTTP
//! responder) runs in sibling tasks on the same single-threaded executor;
//! shared state sits behind mutexes that only ever hand over between await
//! points.

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::spi::{self, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Instant, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use battmon_common::battery::BatteryBank;
use battmon_common::cadence::Cadence;
use battmon_common::clock::WallClock;
use battmon_common::config::{DISPLAY_UPDATE_MS, LOG_INTERVAL_MS, LOOP_YIELD_MS};
use battmon_common::indicator::StatusIndicator;
use battmon_common::timefmt::TimeFormat;
use battmon_common::{logfmt, timefmt};

use crate::display::DisplayView;
use crate::lcd::Lcd1602;
use crate::net;
use crate::sampling::MuxSampler;
use crate::sdlog::SdStorage;
use crate::server;
use crate::sntp;

pub type BankMutex = Mutex<CriticalSectionRawMutex, BatteryBank>;
pub type ClockMutex = Mutex<CriticalSectionRawMutex, WallClock>;
pub type StorageMutex = Mutex<CriticalSectionRawMutex, SdStorage>;

/// Live channel state; written by the scheduler, read by the HTTP responder.
pub static BANK: BankMutex = Mutex::new(BatteryBank::new());

/// Wall-clock sync state; written by the SNTP tasks.
pub static CLOCK: ClockMutex = Mutex::new(WallClock::new());

static STORAGE: StaticCell<StorageMutex> = StaticCell::new();

// Program metadata for `picotool info`
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"battmon"),
    embassy_rp::binary_info::rp_program_description!(c"Battery bank monitor"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Battery monitor starting...");
    let p = embassy_rp::init(Default::default());

    // Status LEDs (red = warning blink, green = all healthy)
    let mut red_led = Output::new(p.PIN_14, Level::Low);
    let mut green_led = Output::new(p.PIN_15, Level::Low);

    // 16x2 LCD behind a PCF8574 backpack on I2C0
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let mut lcd = Lcd1602::new(i2c);
    lcd.init();
    lcd.print_lines("Battery Monitor", "Initializing...");

    // ADC input on GPIO26 behind a 16-channel mux, select lines on GPIO6..9
    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let input = adc::Channel::new_pin(p.PIN_26, Pull::None);
    let select = [
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
    ];
    let mut sampler = MuxSampler::new(adc, input, select);

    // SD card on SPI1
    lcd.print_line(1, "Init SD card...");
    let sd_spi = Spi::new_blocking(p.SPI1, p.PIN_10, p.PIN_11, p.PIN_12, sdlog_spi_config());
    let sd_cs = Output::new(p.PIN_13, Level::High);
    let mut storage = SdStorage::new(sd_spi, sd_cs);
    match storage.ensure_initialized() {
        Ok(true) => {
            info!("created new log file");
            lcd.print_line(1, "SD Card Ready!");
        }
        Ok(false) => {
            info!("log file already exists");
            lcd.print_line(1, "SD Card Ready!");
        }
        Err(err) => {
            warn!("SD card unavailable: {:?}", err);
            lcd.print_line(1, "SD Card Failed!");
        }
    }

    // W5500 ethernet on SPI0, then DHCP (with static fallback)
    lcd.print_line(1, "Getting IP...");
    let mut eth_cfg = spi::Config::default();
    eth_cfg.frequency = 50_000_000;
    let eth_spi = Spi::new(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, p.DMA_CH0, p.DMA_CH1, eth_cfg);
    let eth_cs = Output::new(p.PIN_17, Level::High);
    let eth_int = Input::new(p.PIN_21, Pull::Up);
    let eth_rst = Output::new(p.PIN_20, Level::High);
    let stack = net::start(&spawner, eth_spi, eth_cs, eth_int, eth_rst).await;
    let ip = net::wait_for_ip(stack).await;
    info!("IP address: {}", ip);
    lcd.print_ip(ip);

    // Wall-clock sync: bounded retries now, fire-and-forget refresh later
    lcd.print_line(1, "Syncing time...");
    if sntp::startup_sync(stack, &CLOCK).await {
        lcd.print_line(1, "Time synced!");
    } else {
        lcd.print_line(1, "Time sync failed");
    }
    spawner.spawn(sntp::resync_task(stack, &CLOCK)).unwrap();

    // HTTP responder
    let storage: &'static StorageMutex = STORAGE.init(Mutex::new(storage));
    spawner
        .spawn(server::http_task(stack, &BANK, &CLOCK, storage, ip))
        .unwrap();

    lcd.print_line(1, "Ready!");
    info!("Main loop starting");

    let mut view = DisplayView::new();
    let mut indicator = StatusIndicator::new();
    let mut display_cadence = Cadence::new(DISPLAY_UPDATE_MS);
    let mut log_cadence = Cadence::new(LOG_INTERVAL_MS);

    loop {
        let uptime_ms = Instant::now().as_millis();
        let now_ms = uptime_ms as u32;

        // Sample every pass so derived state is never stale
        {
            let mut bank = BANK.lock().await;
            bank.refresh_all(&mut sampler, now_ms);
        }

        if display_cadence.ready(now_ms) {
            let bank = BANK.lock().await;
            view.render_next(&mut lcd, &bank);
        }

        let any_unhealthy = BANK.lock().await.any_unhealthy();
        let led = indicator.update(any_unhealthy, now_ms);
        red_led.set_level(if led.red { Level::High } else { Level::Low });
        green_led.set_level(if led.green { Level::High } else { Level::Low });

        if log_cadence.ready(now_ms) {
            let timestamp = {
                let clock = CLOCK.lock().await;
                timefmt::format(&clock, uptime_ms, TimeFormat::CsvIso)
            };
            let record = {
                let bank = BANK.lock().await;
                logfmt::record_from_bank(&bank, &timestamp)
            };
            let line = logfmt::serialize(&record);
            match storage.lock().await.append_line(&line) {
                Ok(bytes) => info!("data logged ({} bytes)", bytes),
                Err(err) => warn!("log append failed: {:?}", err),
            }
        }

        Timer::after_millis(LOOP_YIELD_MS).await;
    }
}

/// SD cards want a modest SPI clock; 16 MHz is safely within spec.
fn sdlog_spi_config() -> spi::Config {
    let mut config = spi::Config::default();
    config.frequency = 16_000_000;
    config
}
