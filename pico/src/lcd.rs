//! HD44780 16x2 character LCD behind a PCF8574 I2C backpack.
//!
//! The backpack maps the PCF8574 port onto the LCD's 4-bit bus: data on the
//! high nibble, control on the low bits. Each byte goes out as two nibbles
//! with an enable strobe; timing follows the HD44780 datasheet minimums.

use core::fmt::Write as _;

use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, block_for};
use embedded_hal::i2c::I2c as _;

/// Seven-bit address of the PCF8574 backpack.
const LCD_ADDR: u8 = 0x27;

/// Panel width in characters.
const LCD_COLS: usize = 16;

// PCF8574 port bits
const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0x04;
const REG_SELECT: u8 = 0x01;

// HD44780 commands
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment cursor, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit bus, two lines, 5x8 font
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address per row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

pub struct Lcd1602 {
    i2c: I2c<'static, I2C0, i2c::Blocking>,
}

impl Lcd1602 {
    pub fn new(i2c: I2c<'static, I2C0, i2c::Blocking>) -> Self { Self { i2c } }

    /// Datasheet power-on sequence: three 8-bit function sets, then switch
    /// the bus to 4-bit mode and configure the panel.
    pub fn init(&mut self) {
        block_for(Duration::from_millis(50));
        for _ in 0..3 {
            self.write_nibble(0x30);
            block_for(Duration::from_millis(5));
        }
        self.write_nibble(0x20);
        block_for(Duration::from_millis(1));

        self.command(CMD_FUNCTION_SET);
        self.command(CMD_DISPLAY_ON);
        self.command(CMD_ENTRY_MODE);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.command(CMD_CLEAR);
        block_for(Duration::from_millis(2));
    }

    pub fn set_cursor(
        &mut self,
        col: u8,
        row: u8,
    ) {
        let row = (row as usize).min(ROW_OFFSETS.len() - 1);
        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[row] + col));
    }

    /// Write one row, padded with spaces so stale characters never linger.
    pub fn print_line(
        &mut self,
        row: u8,
        text: &str,
    ) {
        self.set_cursor(0, row);
        let mut written = 0;
        for byte in text.bytes().take(LCD_COLS) {
            self.data(byte);
            written += 1;
        }
        for _ in written..LCD_COLS {
            self.data(b' ');
        }
    }

    pub fn print_lines(
        &mut self,
        top: &str,
        bottom: &str,
    ) {
        self.print_line(0, top);
        self.print_line(1, bottom);
    }

    /// Show the assigned IPv4 address on the bottom row.
    pub fn print_ip(&mut self, ip: embassy_net::Ipv4Address) {
        let mut line: heapless::String<16> = heapless::String::new();
        let octets = ip.octets();
        let _ = write!(line, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
        self.print_line(1, &line);
    }

    fn command(
        &mut self,
        cmd: u8,
    ) {
        self.write_byte(cmd, 0);
    }

    fn data(
        &mut self,
        byte: u8,
    ) {
        self.write_byte(byte, REG_SELECT);
    }

    fn write_byte(
        &mut self,
        value: u8,
        flags: u8,
    ) {
        self.write_nibble((value & 0xF0) | flags);
        self.write_nibble((value << 4) | flags);
    }

    /// Latch one nibble with an enable strobe. I2C errors are ignored; a
    /// disconnected panel must not stall the monitor.
    fn write_nibble(
        &mut self,
        bits: u8,
    ) {
        let byte = bits | BACKLIGHT;
        let _ = self.i2c.write(LCD_ADDR, &[byte | ENABLE]);
        block_for(Duration::from_micros(1));
        let _ = self.i2c.write(LCD_ADDR, &[byte & !ENABLE]);
        block_for(Duration::from_micros(50));
    }
}
