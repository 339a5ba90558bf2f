//! HTTP responder task: one connection, one request, one fixed response.
//!
//! The task owns the listening socket. A request is read until its header
//! terminator (into a bounded buffer), reduced to a route, answered, and the
//! connection is closed; there is no keep-alive and no pipelining. The
//! history route streams the log replay record by record so the body never
//! has to fit in memory.

use core::fmt::Write as _;

use defmt::{info, warn};
use embassy_net::tcp::TcpSocket;
use embassy_net::{Ipv4Address, Stack};
use embassy_time::Timer;
use embedded_io_async::Write as _;

use battmon_common::config::{HTTP_PORT, MAX_REQUEST_HEAD};
use battmon_common::http::dashboard::{DASHBOARD_HEAD, DASHBOARD_TAIL};
use battmon_common::http::response::{
    self,
    HISTORY_HEAD,
    HISTORY_TAIL,
    NOT_FOUND,
    NOT_FOUND_HTML,
    OK_HTML,
    OK_JSON,
};
use battmon_common::http::{Route, find_header_end, route};
use battmon_common::logfmt::{self, LineAssembler};

use crate::app::{BankMutex, ClockMutex, StorageMutex};

#[embassy_executor::task]
pub async fn http_task(
    stack: Stack<'static>,
    bank: &'static BankMutex,
    clock: &'static ClockMutex,
    storage: &'static StorageMutex,
    ip: Ipv4Address,
) -> ! {
    let mut rx_buffer = [0u8; 1024];
    let mut tx_buffer = [0u8; 2048];

    info!("HTTP responder starting on port {}", HTTP_PORT);

    loop {
        stack.wait_config_up().await;

        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        match socket.accept(HTTP_PORT).await {
            Ok(()) => {
                if let Err(err) = handle_connection(&mut socket, bank, clock, storage, ip).await {
                    warn!("connection handling error: {:?}", err);
                }
            }
            Err(err) => {
                warn!("accept error: {:?}", err);
                Timer::after_millis(200).await;
            }
        }
        socket.abort();
    }
}

async fn handle_connection(
    socket: &mut TcpSocket<'_>,
    bank: &'static BankMutex,
    clock: &'static ClockMutex,
    storage: &'static StorageMutex,
    ip: Ipv4Address,
) -> Result<(), embassy_net::tcp::Error> {
    let mut head = [0u8; MAX_REQUEST_HEAD];
    let mut total = 0usize;

    // Read until the header terminator, the peer hangs up, or the bounded
    // buffer fills. Whatever accumulated by then carries the request line.
    loop {
        if total >= head.len() {
            break;
        }
        let n = socket.read(&mut head[total..]).await?;
        if n == 0 {
            break;
        }
        total += n;
        if find_header_end(&head[..total]).is_some() {
            break;
        }
    }
    if total == 0 {
        return Ok(());
    }

    let matched = match core::str::from_utf8(&head[..total]) {
        Ok(text) => route(text),
        Err(_) => Route::NotFound,
    };

    match matched {
        Route::Dashboard => {
            socket.write_all(OK_HTML.as_bytes()).await?;
            socket.write_all(DASHBOARD_HEAD.as_bytes()).await?;
            let mut addr: heapless::String<15> = heapless::String::new();
            let octets = ip.octets();
            let _ = write!(addr, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
            socket.write_all(addr.as_bytes()).await?;
            socket.write_all(DASHBOARD_TAIL.as_bytes()).await?;
        }
        Route::Current => {
            let mut body = response::SnapshotJson::new();
            {
                let bank = bank.lock().await;
                let clock = clock.lock().await;
                let uptime_ms = embassy_time::Instant::now().as_millis();
                response::current_json(&bank, &clock, uptime_ms, &mut body);
            }
            socket.write_all(OK_JSON.as_bytes()).await?;
            socket.write_all(body.as_bytes()).await?;
        }
        Route::History => {
            socket.write_all(OK_JSON.as_bytes()).await?;
            send_history(socket, storage).await?;
        }
        Route::NotFound => {
            socket.write_all(NOT_FOUND.as_bytes()).await?;
            socket.write_all(NOT_FOUND_HTML.as_bytes()).await?;
        }
    }

    socket.flush().await?;
    Ok(())
}

/// Replay the persisted log into the history body, one record per chunk.
/// Storage trouble mid-scan truncates the replay; the body stays
/// well-formed either way.
async fn send_history(
    socket: &mut TcpSocket<'_>,
    storage: &'static StorageMutex,
) -> Result<(), embassy_net::tcp::Error> {
    socket.write_all(HISTORY_HEAD.as_bytes()).await?;

    let mut storage = storage.lock().await;
    let mut assembler = LineAssembler::new();
    let mut entry = response::RecordJson::new();
    let mut chunk = [0u8; 256];
    let mut offset = 0u32;
    let mut header_skipped = false;
    let mut first = true;

    'scan: loop {
        let n = match storage.read_chunk(offset, &mut chunk) {
            Ok(0) => break 'scan,
            Ok(n) => n,
            Err(err) => {
                warn!("history replay read failed: {:?}", err);
                break 'scan;
            }
        };
        offset += n as u32;

        for &byte in &chunk[..n] {
            if !assembler.push(byte) {
                continue;
            }
            // The first line is the column header
            let record = if header_skipped {
                assembler.line().and_then(logfmt::parse_line)
            } else {
                header_skipped = true;
                None
            };
            assembler.clear();

            if let Some(record) = record {
                response::history_record_json(&record, first, &mut entry);
                socket.write_all(entry.as_bytes()).await?;
                first = false;
            }
        }
    }

    // A crash-truncated file may end without a newline
    if header_skipped && !assembler.is_empty() {
        if let Some(record) = assembler.line().and_then(logfmt::parse_line) {
            response::history_record_json(&record, first, &mut entry);
            socket.write_all(entry.as_bytes()).await?;
        }
    }

    socket.write_all(HISTORY_TAIL.as_bytes()).await?;
    Ok(())
}
