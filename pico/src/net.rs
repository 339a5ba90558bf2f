//! W5500 ethernet bring-up and IPv4 configuration.
//!
//! The chip driver and the network stack each run in their own task; the
//! rest of the firmware only sees the `Stack` handle. Address assignment is
//! DHCP first, falling back to a fixed address if no lease arrives.

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::{
    Config as NetConfig, ConfigV4, Ipv4Address, Ipv4Cidr, Stack, StackResources, StaticConfigV4,
};
use embassy_net_wiznet::chip::W5500;
use embassy_net_wiznet::{Device, Runner, State};
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};
use embassy_time::{Delay, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use static_cell::StaticCell;

/// Locally administered MAC for the monitor.
const MAC_ADDR: [u8; 6] = [0xA8, 0x61, 0x0A, 0xAE, 0x34, 0xF2];

/// How long to wait for a DHCP lease before falling back.
const DHCP_TIMEOUT_SECS: u64 = 15;

/// Address used when no DHCP server answers.
const FALLBACK_IP: Ipv4Address = Ipv4Address::new(192, 168, 1, 177);

type EthSpiDevice = ExclusiveDevice<Spi<'static, SPI0, Async>, Output<'static>, Delay>;

#[embassy_executor::task]
async fn ethernet_task(
    runner: Runner<'static, W5500, EthSpiDevice, Input<'static>, Output<'static>>,
) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, Device<'static>>) -> ! {
    runner.run().await
}

/// Bring up the chip driver and the network stack; returns the shared
/// stack handle once both runners are spawned.
pub async fn start(
    spawner: &Spawner,
    spi: Spi<'static, SPI0, Async>,
    cs: Output<'static>,
    int: Input<'static>,
    reset: Output<'static>,
) -> Stack<'static> {
    let spi_device = ExclusiveDevice::new(spi, cs, Delay).expect("ethernet chip select");

    static STATE: StaticCell<State<8, 8>> = StaticCell::new();
    let state = STATE.init(State::<8, 8>::new());
    let (device, runner) = embassy_net_wiznet::new(MAC_ADDR, state, spi_device, int, reset)
        .await
        .expect("W5500 init");
    spawner.spawn(ethernet_task(runner)).unwrap();

    let mut rng = RoscRng;
    let seed = rng.next_u64();

    static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        device,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    info!("ethernet link starting, requesting DHCP lease");
    stack
}

/// Wait for an IPv4 configuration, switching to the fallback address if
/// DHCP does not answer in time.
pub async fn wait_for_ip(stack: Stack<'static>) -> Ipv4Address {
    match select(
        stack.wait_config_up(),
        Timer::after_secs(DHCP_TIMEOUT_SECS),
    )
    .await
    {
        Either::First(()) => {}
        Either::Second(()) => {
            warn!("DHCP failed, using fallback IP");
            stack.set_config_v4(ConfigV4::Static(StaticConfigV4 {
                address: Ipv4Cidr::new(FALLBACK_IP, 24),
                gateway: None,
                dns_servers: Default::default(),
            }));
            stack.wait_config_up().await;
        }
    }

    match stack.config_v4() {
        Some(config) => config.address.address(),
        None => FALLBACK_IP,
    }
}
