use core::{
    cell::{Cell, RefCell},
    fmt,
    net::Ipv4Addr,
};

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embassy_time::Duration;
use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{self, SpiBus},
};

use crate::{
    ffi::SL_P_EVENT_HANDLER,
    stack::{NetAppEvent, SecParams, SecurityType, SimpleLink, SlEventHandler, WlanEvent},
    sync::{IrqSignal, LinkSignal, LinkState},
    SlError, SlResult,
};

/// The SPI mode the NWP expects: 8-bit words, clock idle low, data sampled on the rising edge.
pub const SPI_MODE: spi::Mode = spi::MODE_0;
/// The default SPI clock frequency in Hz.
pub const SL_SPI_DEFAULT_FREQ: u32 = 16_000_000;

/// The byte clocked out while reading.
const DUMMY_BYTE: u8 = 0xff;
const MAX_SSID_LEN: usize = 32;
const MAX_KEY_LEN: usize = 64;

/// The interrupt handler registered by the host driver.
pub type IrqHandler = SL_P_EVENT_HANDLER;

/// A MAC address.
///
/// This is displayed the way the NWP tooling does it, as uppercase hex without zero padding,
/// so `00:1A:...` becomes `0:1A:...`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);
impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:X}:{b:X}:{c:X}:{d:X}:{e:X}:{g:X}")
    }
}

/// Where the interrupt handler of the host driver is called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqDispatch {
    /// [Cc3100::on_irq_edge] calls the handler right away, unless the interrupt is masked.
    ///
    /// The non-OS host driver busy waits inside its API calls until the handler ran, so this is
    /// required, unless another thread of execution runs [Cc3100::dispatch_irq] in the meantime.
    #[default]
    Immediate,
    /// Edges are only recorded. The handler runs in [Cc3100::dispatch_irq] or
    /// [Cc3100::service_interrupts].
    Deferred,
}

/// Configuration of the [Cc3100] driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cc3100Config {
    /// Log every bus transfer, power transition and unhandled event.
    pub debug: bool,
    /// How long the NWP is kept in hibernation at construction.
    ///
    /// The datasheet specifies 10 ms as minimum hibernation time, so we default to twice that.
    pub hibernate_delay: Duration,
    pub irq_dispatch: IrqDispatch,
}
impl Default for Cc3100Config {
    fn default() -> Self {
        Self {
            debug: false,
            hibernate_delay: Duration::from_millis(20),
            irq_dispatch: IrqDispatch::default(),
        }
    }
}

/// The transient network state reported by the NWP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NetState {
    connected: bool,
    mac: MacAddress,
    ip: Ipv4Addr,
    gateway: Ipv4Addr,
    dns: Ipv4Addr,
    rssi: i8,
}
impl NetState {
    const fn new() -> Self {
        Self {
            connected: false,
            mac: MacAddress([0; 6]),
            ip: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            dns: Ipv4Addr::UNSPECIFIED,
            rssi: 0,
        }
    }
}

/// The physical transport to the NWP.
struct Bus<SPI, CS, NHIB> {
    spi: SPI,
    cs: CS,
    n_hib: NHIB,
}

/// Returns `None` for the unspecified address.
fn assigned(address: Ipv4Addr) -> Option<Ipv4Addr> {
    (!address.is_unspecified()).then_some(address)
}

/// Driver for a CC3100 network processor (NWP) attached over SPI.
///
/// This owns the SPI bus, the chip select and nHIB lines, and caches the network state the NWP
/// reports through events. All operations take `&self`, since the driver is shared between the
/// host driver's callback table, the interrupt handler and application code.
///
/// The interrupt line isn't owned by the driver. The board has to configure it with a pull-down,
/// since it floats while the NWP is hibernating, and call [Cc3100::on_irq_edge] on every rising
/// edge.
pub struct Cc3100<M: RawMutex, SPI, CS, NHIB> {
    bus: Mutex<M, RefCell<Bus<SPI, CS, NHIB>>>,
    net_state: Mutex<M, Cell<NetState>>,
    irq_handler: Mutex<M, Cell<Option<IrqHandler>>>,
    irq_signal: IrqSignal,
    link_signal: LinkSignal,
    config: Cc3100Config,
}
impl<M, SPI, CS, NHIB> Cc3100<M, SPI, CS, NHIB>
where
    M: RawMutex,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    NHIB: OutputPin,
{
    /// Initialize the driver.
    ///
    /// The SPI bus must already be configured for [SPI_MODE]. The NWP is put into hibernation for
    /// [Cc3100Config::hibernate_delay], so it starts from a clean state once enabled.
    pub fn new(
        spi: SPI,
        mut cs: CS,
        mut n_hib: NHIB,
        delay: &mut impl DelayNs,
        config: Cc3100Config,
    ) -> SlResult<Self> {
        n_hib.set_low().map_err(|_| SlError::Pin)?;
        cs.set_high().map_err(|_| SlError::Pin)?;
        delay.delay_us(u32::try_from(config.hibernate_delay.as_micros()).unwrap_or(u32::MAX));
        trace!("CC3100 driver initialized.");
        Ok(Self {
            bus: Mutex::new(RefCell::new(Bus { spi, cs, n_hib })),
            net_state: Mutex::new(Cell::new(NetState::new())),
            irq_handler: Mutex::new(Cell::new(None)),
            irq_signal: IrqSignal::new(),
            link_signal: LinkSignal::new(),
            config,
        })
    }
    /// Start the host driver and the NWP.
    ///
    /// Returns the role the NWP started in.
    pub fn start(&self, stack: &impl SimpleLink) -> SlResult<i16> {
        let res = stack.start();
        sl_debug!(self.config.debug, "SL: sl_Start -> {}", res);
        if res < 0 {
            return Err(SlError::Vendor(res));
        }
        Ok(res)
    }
    fn with_bus<T>(&self, f: impl FnOnce(&mut Bus<SPI, CS, NHIB>) -> T) -> T {
        self.bus.lock(|bus| f(&mut bus.borrow_mut()))
    }
    /// Take the NWP out of hibernation.
    pub fn enable(&self) -> SlResult<()> {
        sl_debug!(self.config.debug, "SL: device enable");
        self.with_bus(|bus| bus.n_hib.set_high().map_err(|_| SlError::Pin))
    }
    /// Put the NWP into hibernation.
    pub fn disable(&self) -> SlResult<()> {
        sl_debug!(self.config.debug, "SL: device disable");
        self.with_bus(|bus| bus.n_hib.set_low().map_err(|_| SlError::Pin))
    }
    /// Run a transfer with chip select asserted.
    ///
    /// Chip select is deasserted again, even if the transfer failed.
    fn transaction(
        bus: &mut Bus<SPI, CS, NHIB>,
        f: impl FnOnce(&mut SPI) -> Result<(), SPI::Error>,
    ) -> SlResult<()> {
        bus.cs.set_low().map_err(|_| SlError::Pin)?;
        let res = f(&mut bus.spi).and_then(|_| bus.spi.flush());
        bus.cs.set_high().map_err(|_| SlError::Pin)?;
        res.map_err(|_| SlError::Bus)
    }
    /// Read `buffer.len()` bytes from the NWP.
    ///
    /// This blocks until the whole buffer was filled and returns its length.
    pub fn read(&self, buffer: &mut [u8]) -> SlResult<usize> {
        let len = buffer.len();
        sl_debug!(self.config.debug, "SL: read {} bytes from SPI", len);
        buffer.fill(DUMMY_BYTE);
        self.with_bus(|bus| Self::transaction(bus, |spi| spi.transfer_in_place(buffer)))?;
        Ok(len)
    }
    /// Write the entire buffer to the NWP.
    ///
    /// This blocks until all bytes were clocked out and returns the length of the buffer.
    pub fn write(&self, buffer: &[u8]) -> SlResult<usize> {
        sl_debug!(self.config.debug, "SL: write {} bytes to SPI", buffer.len());
        self.with_bus(|bus| Self::transaction(bus, |spi| spi.write(buffer)))?;
        Ok(buffer.len())
    }
    /// Issue a WPA/WPA2 connect request.
    ///
    /// See [Cc3100::wlan_connect_with].
    pub fn wlan_connect(&self, stack: &impl SimpleLink, ssid: &str, pass: &str) -> SlResult<()> {
        self.wlan_connect_with(stack, ssid, pass, SecurityType::WpaWpa2)
    }
    /// Issue a connect request.
    ///
    /// This also refreshes the cached MAC address. It doesn't wait for the connection to be
    /// established, which is reported asynchronously through the event handlers.
    pub fn wlan_connect_with(
        &self,
        stack: &impl SimpleLink,
        ssid: &str,
        pass: &str,
        security: SecurityType,
    ) -> SlResult<()> {
        let key = if security == SecurityType::Open {
            &[][..]
        } else {
            pass.as_bytes()
        };
        if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || key.len() > MAX_KEY_LEN {
            return Err(SlError::InvalidCredentials);
        }

        let mut mac = [0u8; 6];
        let res = stack.get_mac_address(&mut mac);
        if res < 0 {
            warn!("Reading the MAC address failed: {}", res);
        } else {
            self.update_net_state(|net_state| net_state.mac = MacAddress(mac));
        }

        sl_debug!(self.config.debug, "SL: starting WiFi connect");
        // The addresses of a previous connection are stale from here on.
        self.update_net_state(|net_state| {
            net_state.ip = Ipv4Addr::UNSPECIFIED;
            net_state.gateway = Ipv4Addr::UNSPECIFIED;
            net_state.dns = Ipv4Addr::UNSPECIFIED;
        });
        self.link_signal.set(LinkState::Connecting);
        let res = stack.wlan_connect(ssid.as_bytes(), None, &SecParams { security, key });
        if res < 0 {
            self.link_signal.set(LinkState::Failed);
            return Err(SlError::Vendor(res));
        }
        Ok(())
    }
    /// Block delivery of interrupts to the host driver.
    ///
    /// Edges arriving while masked are latched and delivered after [Cc3100::unmask_irq].
    pub fn mask_irq(&self) {
        self.irq_signal.set_masked(true);
    }
    /// Resume delivery of interrupts to the host driver.
    ///
    /// With [IrqDispatch::Immediate], edges latched while masked are delivered right here.
    pub fn unmask_irq(&self) {
        self.irq_signal.set_masked(false);
        if self.config.irq_dispatch == IrqDispatch::Immediate {
            self.dispatch_irq();
        }
    }
    /// Register the interrupt handler of the host driver.
    ///
    /// There is only one handler at a time, so this replaces any previous one.
    pub fn register_interrupt_handler(&self, handler: IrqHandler) {
        self.irq_handler.lock(|irq_handler| irq_handler.set(Some(handler)));
    }
    /// Remove the interrupt handler. Edges arriving afterwards are dropped.
    pub fn unregister_interrupt_handler(&self) {
        self.irq_handler.lock(|irq_handler| irq_handler.set(None));
    }
    /// Record a rising edge of the interrupt line.
    ///
    /// This is meant to be called from the board's GPIO interrupt handler. With
    /// [IrqDispatch::Immediate] the host driver's handler is called from here, unless the
    /// interrupt is masked. Otherwise that happens in [Cc3100::dispatch_irq] or
    /// [Cc3100::service_interrupts].
    #[inline]
    pub fn on_irq_edge(&self) {
        self.irq_signal.put();
        if self.config.irq_dispatch == IrqDispatch::Immediate {
            // Checked after recording, so an unmask racing with us can't strand the edge.
            self.dispatch_irq();
        }
    }
    fn run_irq_handler(&self, edges: usize) -> usize {
        let Some(handler) = self.irq_handler.lock(Cell::get) else {
            warn!("Dropping {} interrupt(s), since no handler is registered.", edges);
            return 0;
        };
        for _ in 0..edges {
            handler();
        }
        edges
    }
    /// Call the registered interrupt handler once for every edge recorded since the last call.
    ///
    /// Returns the number of edges, that were dispatched.
    pub fn dispatch_irq(&self) -> usize {
        match self.irq_signal.take() {
            0 => 0,
            edges => self.run_irq_handler(edges),
        }
    }
    /// Dispatch interrupts to the host driver as they arrive.
    ///
    /// This is meant for [IrqDispatch::Deferred]. With immediate dispatch there's nothing left
    /// to do for it.
    pub async fn service_interrupts(&self) -> ! {
        loop {
            let edges = self.irq_signal.next().await;
            self.run_irq_handler(edges);
        }
    }
    fn update_net_state(&self, f: impl FnOnce(&mut NetState)) {
        self.net_state.lock(|net_state| {
            let mut state = net_state.get();
            f(&mut state);
            net_state.set(state);
        });
    }
    fn net_state(&self) -> NetState {
        self.net_state.lock(Cell::get)
    }
    /// Check if we're associated with an AP.
    pub fn is_connected(&self) -> bool {
        self.net_state().connected
    }
    /// The MAC address read during the last connect request.
    pub fn mac_address(&self) -> MacAddress {
        self.net_state().mac
    }
    /// The acquired IPv4 address, if any.
    pub fn ip_address(&self) -> Option<Ipv4Addr> {
        assigned(self.net_state().ip)
    }
    /// The gateway of the network, if any.
    pub fn gateway(&self) -> Option<Ipv4Addr> {
        assigned(self.net_state().gateway)
    }
    /// The DNS server of the network, if any.
    pub fn dns(&self) -> Option<Ipv4Addr> {
        assigned(self.net_state().dns)
    }
    /// The cached signal strength.
    ///
    /// None of the events we handle carry the RSSI, so this is never updated.
    pub fn rssi(&self) -> i8 {
        self.net_state().rssi
    }
    /// The current state of the link.
    pub fn link_state(&self) -> LinkState {
        self.link_signal.get()
    }
    pub(crate) fn fail_link(&self) {
        self.link_signal.set(LinkState::Failed);
    }
    /// Wait until the link state is something other than `seen`.
    pub async fn link_state_changed(&self, seen: LinkState) -> LinkState {
        self.link_signal.changed_from(seen).await
    }
}
impl<M, SPI, CS, NHIB> SlEventHandler for Cc3100<M, SPI, CS, NHIB>
where
    M: RawMutex,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    NHIB: OutputPin,
{
    fn wlan_event(&self, event: WlanEvent) {
        match event {
            WlanEvent::Connect => {
                sl_debug!(self.config.debug, "SL: connected to WiFi");
                self.update_net_state(|net_state| net_state.connected = true);
                self.link_signal.set(LinkState::Associated);
            }
            WlanEvent::Disconnect => {
                sl_debug!(self.config.debug, "SL: disconnected WiFi");
                self.update_net_state(|net_state| net_state.connected = false);
                match self.link_signal.get() {
                    // While connecting to another AP, the NWP first reports the old link
                    // dropping. Only losing the new association counts as failure.
                    LinkState::Connecting => {}
                    LinkState::Associated => self.link_signal.set(LinkState::Failed),
                    _ => self.link_signal.set(LinkState::Disconnected),
                }
            }
            WlanEvent::Other(code) => {
                sl_debug!(self.config.debug, "SL: got wlan event {}", code);
            }
        }
    }
    fn netapp_event(&self, event: NetAppEvent) {
        match event {
            NetAppEvent::Ipv4Acquired { ip, gateway, dns } => {
                sl_debug!(self.config.debug, "SL: got IP");
                self.update_net_state(|net_state| {
                    net_state.ip = ip;
                    net_state.gateway = gateway;
                    net_state.dns = dns;
                });
                if !ip.is_unspecified() {
                    self.link_signal.set(LinkState::Connected);
                }
            }
            NetAppEvent::Other(code) => {
                sl_debug!(self.config.debug, "SL: got NetApp event: {}", code);
            }
        }
    }
}
