use core::net::Ipv4Addr;

use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{with_timeout, Duration, Timer};
use embedded_hal::{digital::OutputPin, spi::SpiBus};

use crate::{
    board::{Cc3100, MacAddress},
    socket::NetworkStack,
    stack::{SecurityType, SimpleLink},
    sync::LinkState,
    SlError, SlResult,
};

/// Controls how [SimpleLinkInterface::connect] waits for the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectConfig {
    /// How often the event loop of the host driver is run, while waiting.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits until the connection either succeeds or fails.
    pub timeout: Option<Duration>,
}
impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: None,
        }
    }
}

/// An access point found during a scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessPoint {
    pub ssid: [u8; 32],
    pub ssid_len: u8,
    pub bssid: MacAddress,
    pub security: SecurityType,
    pub rssi: i8,
    pub channel: u8,
}

/// A generic interface for managing a WiFi station.
#[allow(async_fn_in_trait)]
pub trait WifiInterface<'a> {
    /// Set the credentials used by the next connect.
    fn set_credentials(
        &mut self,
        ssid: &'a str,
        pass: &'a str,
        security: SecurityType,
    ) -> SlResult<()>;
    /// Set the channel used by the next connect. `0` means any channel.
    fn set_channel(&mut self, channel: u8) -> SlResult<()>;
    /// Connect to the network and wait until an IP address was acquired.
    async fn connect(
        &mut self,
        ssid: &'a str,
        pass: &'a str,
        security: SecurityType,
        channel: u8,
    ) -> SlResult<()>;
    fn disconnect(&mut self) -> SlResult<()>;
    fn ip_address(&self) -> Option<Ipv4Addr>;
    fn gateway(&self) -> Option<Ipv4Addr>;
    fn mac_address(&self) -> MacAddress;
    fn rssi(&self) -> i8;
    /// Scan for access points, returning how many were written to `results`.
    fn scan(&mut self, results: &mut [AccessPoint]) -> SlResult<usize>;
    /// The IP stack behind this interface, if it has one.
    fn network_stack(&self) -> Option<&dyn NetworkStack>;
}

/// The [WifiInterface] of a [Cc3100].
///
/// Any number of these may share one driver.
pub struct SimpleLinkInterface<'a, M: RawMutex, SPI, CS, NHIB, S> {
    board: &'a Cc3100<M, SPI, CS, NHIB>,
    stack: S,
    ssid: Option<&'a str>,
    pass: &'a str,
    security: SecurityType,
    channel: u8,
    connect_config: ConnectConfig,
}
impl<'a, M, SPI, CS, NHIB, S> SimpleLinkInterface<'a, M, SPI, CS, NHIB, S>
where
    M: RawMutex,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    NHIB: OutputPin,
    S: SimpleLink,
{
    pub fn new(
        board: &'a Cc3100<M, SPI, CS, NHIB>,
        stack: S,
        connect_config: ConnectConfig,
    ) -> Self {
        Self {
            board,
            stack,
            ssid: None,
            pass: "",
            security: SecurityType::default(),
            channel: 0,
            connect_config,
        }
    }
    /// The driver behind this interface.
    pub fn board(&self) -> &'a Cc3100<M, SPI, CS, NHIB> {
        self.board
    }
    /// The channel set through [WifiInterface::set_channel].
    ///
    /// The NWP picks the channel itself, so this isn't passed along.
    pub fn channel(&self) -> u8 {
        self.channel
    }
    /// Issue a connect request with the stored credentials, without waiting for it to complete.
    pub fn start_connect(&mut self) -> SlResult<()> {
        let Some(ssid) = self.ssid else {
            return Err(SlError::NoCredentials);
        };
        self.board
            .wlan_connect_with(&self.stack, ssid, self.pass, self.security)
    }
    /// Run one poll cycle: dispatch pending interrupts and run the host driver's event loop.
    fn pump_events(&self) {
        self.board.dispatch_irq();
        self.stack.run_event_task(self.board);
    }
    /// Poll the host driver until we either got an IP address, or the link failed.
    async fn wait_for_ip(&self) -> SlResult<()> {
        loop {
            let seen = self.board.link_state();
            match seen {
                LinkState::Connected if self.board.ip_address().is_some() => return Ok(()),
                LinkState::Failed => return Err(SlError::ConnectFailed),
                _ => {}
            }
            self.pump_events();
            // Sleep for the poll interval, unless the event loop already changed something.
            select(
                self.board.link_state_changed(seen),
                Timer::after(self.connect_config.poll_interval),
            )
            .await;
        }
    }
}
impl<'a, M, SPI, CS, NHIB, S> WifiInterface<'a> for SimpleLinkInterface<'a, M, SPI, CS, NHIB, S>
where
    M: RawMutex,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    NHIB: OutputPin,
    S: SimpleLink,
{
    fn set_credentials(
        &mut self,
        ssid: &'a str,
        pass: &'a str,
        security: SecurityType,
    ) -> SlResult<()> {
        self.ssid = Some(ssid);
        self.pass = pass;
        self.security = security;
        Ok(())
    }
    fn set_channel(&mut self, channel: u8) -> SlResult<()> {
        self.channel = channel;
        Ok(())
    }
    async fn connect(
        &mut self,
        ssid: &'a str,
        pass: &'a str,
        security: SecurityType,
        channel: u8,
    ) -> SlResult<()> {
        self.set_credentials(ssid, pass, security)?;
        self.set_channel(channel)?;
        self.start_connect()?;

        let Some(timeout) = self.connect_config.timeout else {
            return self.wait_for_ip().await;
        };
        match with_timeout(timeout, self.wait_for_ip()).await {
            Ok(res) => res,
            Err(_) => {
                debug!("Connecting timed out after {} ms.", timeout.as_millis());
                self.board.fail_link();
                Err(SlError::Timeout)
            }
        }
    }
    /// Not implemented. This returns `Ok` and leaves the connection alone.
    fn disconnect(&mut self) -> SlResult<()> {
        Ok(())
    }
    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.board.ip_address()
    }
    fn gateway(&self) -> Option<Ipv4Addr> {
        self.board.gateway()
    }
    fn mac_address(&self) -> MacAddress {
        self.board.mac_address()
    }
    fn rssi(&self) -> i8 {
        self.board.rssi()
    }
    fn scan(&mut self, _results: &mut [AccessPoint]) -> SlResult<usize> {
        Err(SlError::Unsupported)
    }
    /// We don't provide an IP stack, only management of the WiFi link.
    fn network_stack(&self) -> Option<&dyn NetworkStack> {
        None
    }
}
