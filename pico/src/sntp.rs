//! SNTP client: one-shot queries against the configured pool server.
//!
//! A query resolves the server, sends the 48-byte mode-3 request over UDP,
//! and extracts the transmit timestamp from the response. Startup runs a
//! bounded retry loop so the monitor degrades to unsynced operation instead
//! of hanging; after that a background task refreshes the clock on a fixed
//! interval and swallows failures.

use defmt::{info, warn};
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Instant, Timer};

use battmon_common::config::{
    NTP_RETRY_DELAY_MS,
    NTP_SERVER,
    NTP_STARTUP_ATTEMPTS,
    NTP_SYNC_INTERVAL_SECS,
};

use crate::app::ClockMutex;

/// NTP uses UDP port 123.
const SNTP_PORT: u16 = 123;

/// Local port for the exchange.
const LOCAL_PORT: u16 = 12345;

/// Response wait before a query is abandoned.
const SNTP_TIMEOUT_MS: u64 = 5_000;

/// Offset between the NTP era (1900) and the Unix epoch (1970), in seconds.
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum SntpError {
    /// DNS resolution returned nothing.
    Dns,
    /// Socket bind or send failed.
    Network,
    /// No response within the window.
    Timeout,
    /// Response too short or served by an unsynchronized source.
    InvalidResponse,
}

/// One request/response exchange; returns the server's UTC epoch seconds.
async fn query(stack: Stack<'static>) -> Result<u64, SntpError> {
    let server_ip = *stack
        .dns_query(NTP_SERVER, DnsQueryType::A)
        .await
        .map_err(|_| SntpError::Dns)?
        .first()
        .ok_or(SntpError::Dns)?;
    let endpoint = IpEndpoint::new(server_ip, SNTP_PORT);

    // NTP packets are 48 bytes; the buffers stay small
    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buffer = [0u8; 64];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_buffer = [0u8; 64];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(LOCAL_PORT).map_err(|_| SntpError::Network)?;

    // LI=0, VN=3, Mode=3 (client)
    let mut request = [0u8; 48];
    request[0] = 0x1B;
    socket
        .send_to(&request, endpoint)
        .await
        .map_err(|_| SntpError::Network)?;

    let mut response = [0u8; 48];
    let timeout = Timer::after(Duration::from_millis(SNTP_TIMEOUT_MS));
    let (len, _from) = match embassy_futures::select::select(timeout, socket.recv_from(&mut response)).await
    {
        embassy_futures::select::Either::First(_) => return Err(SntpError::Timeout),
        embassy_futures::select::Either::Second(result) => {
            result.map_err(|_| SntpError::Network)?
        }
    };

    if len < 48 {
        return Err(SntpError::InvalidResponse);
    }

    // Stratum 0 is a kiss-of-death, anything above 15 is unsynchronized
    let stratum = response[1];
    if stratum == 0 || stratum > 15 {
        return Err(SntpError::InvalidResponse);
    }

    // Transmit timestamp seconds, bytes 40..44
    let ntp_secs =
        u32::from_be_bytes([response[40], response[41], response[42], response[43]]) as u64;
    ntp_secs
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or(SntpError::InvalidResponse)
}

/// Startup synchronization with a bounded number of attempts. Returns
/// whether the clock was set.
pub async fn startup_sync(
    stack: Stack<'static>,
    clock: &ClockMutex,
) -> bool {
    info!("initializing SNTP client");
    for attempt in 1..=NTP_STARTUP_ATTEMPTS {
        match query(stack).await {
            Ok(epoch) => {
                clock.lock().await.set(epoch, Instant::now().as_millis());
                info!("time synced on attempt {}: epoch {}", attempt, epoch);
                return true;
            }
            Err(err) => {
                warn!("SNTP attempt {} failed: {:?}", attempt, err);
                Timer::after_millis(NTP_RETRY_DELAY_MS).await;
            }
        }
    }
    warn!("time sync failed, continuing unsynced");
    false
}

/// Periodic re-synchronization. Failures leave the previous sync in effect.
#[embassy_executor::task]
pub async fn resync_task(
    stack: Stack<'static>,
    clock: &'static ClockMutex,
) -> ! {
    loop {
        Timer::after_secs(NTP_SYNC_INTERVAL_SECS).await;
        match query(stack).await {
            Ok(epoch) => {
                clock.lock().await.set(epoch, Instant::now().as_millis());
                info!("periodic time sync: epoch {}", epoch);
            }
            Err(err) => warn!("periodic time sync failed: {:?}", err),
        }
    }
}
