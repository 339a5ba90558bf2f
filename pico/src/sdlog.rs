//! SD-card storage collaborator for the battery log.
//!
//! Every operation is its own open-act-close transaction against
//! `battery.csv`: the file handle never survives between scheduler cycles,
//! so a record is durable as soon as the append returns and a yanked card
//! costs at most the row being written. Replay uses a stateless chunked
//! read, reopening the file per chunk for the same reason.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI1;
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{Mode, SdCard, TimeSource, Timestamp, VolumeIdx, VolumeManager};

use battmon_common::config::LOG_FILE;
use battmon_common::logfmt;

/// Storage failure taxonomy; every operation degrades, none are fatal.
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum StorageError {
    /// Card, volume, or file could not be opened.
    Unavailable,
    /// The write or flush did not complete.
    WriteFailed,
}

/// FAT directory timestamps are not meaningful here; every CSV row carries
/// its own UTC stamp.
struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp { Timestamp::from_fat(0, 0) }
}

type SdSpiDevice = ExclusiveDevice<Spi<'static, SPI1, Blocking>, Output<'static>, Delay>;
type SdManager = VolumeManager<SdCard<SdSpiDevice, Delay>, FixedTime>;

pub struct SdStorage {
    manager: SdManager,
}

impl SdStorage {
    pub fn new(
        spi: Spi<'static, SPI1, Blocking>,
        cs: Output<'static>,
    ) -> Self {
        let device = ExclusiveDevice::new(spi, cs, Delay).expect("SD chip select");
        let card = SdCard::new(device, Delay);
        Self {
            manager: VolumeManager::new(card, FixedTime),
        }
    }

    /// Open or create the log file; a brand-new (empty) file gets the fixed
    /// header line. Returns whether the header was written. Idempotent.
    pub fn ensure_initialized(&mut self) -> Result<bool, StorageError> {
        let volume = self
            .manager
            .open_volume(VolumeIdx(0))
            .map_err(|_| StorageError::Unavailable)?;
        let root = volume.open_root_dir().map_err(|_| StorageError::Unavailable)?;
        let file = root
            .open_file_in_dir(LOG_FILE, Mode::ReadWriteCreateOrAppend)
            .map_err(|_| StorageError::Unavailable)?;

        if file.length() > 0 {
            return Ok(false);
        }
        let header = logfmt::csv_header();
        file.write(header.as_bytes())
            .map_err(|_| StorageError::WriteFailed)?;
        file.flush().map_err(|_| StorageError::WriteFailed)?;
        Ok(true)
    }

    /// Append one serialized record line, flushed before the handle closes.
    /// Returns the byte count written.
    pub fn append_line(
        &mut self,
        line: &str,
    ) -> Result<usize, StorageError> {
        let volume = self
            .manager
            .open_volume(VolumeIdx(0))
            .map_err(|_| StorageError::Unavailable)?;
        let root = volume.open_root_dir().map_err(|_| StorageError::Unavailable)?;
        let file = root
            .open_file_in_dir(LOG_FILE, Mode::ReadWriteCreateOrAppend)
            .map_err(|_| StorageError::Unavailable)?;

        file.write(line.as_bytes())
            .map_err(|_| StorageError::WriteFailed)?;
        file.flush().map_err(|_| StorageError::WriteFailed)?;
        Ok(line.len())
    }

    /// Read up to `buf.len()` bytes starting at `offset`. Returns 0 at end
    /// of file. Each call is an independent open-read-close, so replay needs
    /// no cursor on this side.
    pub fn read_chunk(
        &mut self,
        offset: u32,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let volume = self
            .manager
            .open_volume(VolumeIdx(0))
            .map_err(|_| StorageError::Unavailable)?;
        let root = volume.open_root_dir().map_err(|_| StorageError::Unavailable)?;
        let file = root
            .open_file_in_dir(LOG_FILE, Mode::ReadOnly)
            .map_err(|_| StorageError::Unavailable)?;

        if offset >= file.length() {
            return Ok(0);
        }
        file.seek_from_start(offset)
            .map_err(|_| StorageError::Unavailable)?;
        file.read(buf).map_err(|_| StorageError::Unavailable)
    }
}
