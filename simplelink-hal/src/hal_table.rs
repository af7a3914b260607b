//! The HAL callback table of the SimpleLink host driver.
//!
//! The host driver expects the platform to provide a set of C functions for powering the NWP,
//! talking to it over SPI and handling its interrupt. It is told about them through its `user.h`,
//! which should map them like this:
//!
//! ```c
//! #define sl_DeviceEnablePreamble()   slhal_DeviceEnablePreamble()
//! #define sl_DeviceEnable()           slhal_DeviceEnable()
//! #define sl_DeviceDisable()          slhal_DeviceDisable()
//! #define sl_IfOpen                   slhal_IfOpen
//! #define sl_IfClose                  slhal_IfClose
//! #define sl_IfRead                   slhal_IfRead
//! #define sl_IfWrite                  slhal_IfWrite
//! #define sl_IfRegIntHdlr             slhal_IfRegIntHdlr
//! #define sl_IfMaskIntHdlr()          slhal_IfMaskIntHdlr()
//! #define sl_IfUnMaskIntHdlr()        slhal_IfUnMaskIntHdlr()
//! #define sl_GeneralEvtHdlr           slhal_GeneralEvtHdlr
//! #define sl_WlanEvtHdlr              slhal_WlanEvtHdlr
//! #define sl_NetAppEvtHdlr            slhal_NetAppEvtHdlr
//! #define sl_HttpServerCallback       slhal_HttpServerCallback
//! #define sl_SockEvtHdlr              slhal_SockEvtHdlr
//! ```
//!
//! The functions carry the `slhal_` prefix, since nothing here is tied to a particular board
//! SDK. A `user.h` written for the mbed port maps to `mbed_sl_*` instead, and has to be switched
//! to the names above.
//!
//! Most of these functions don't take a context argument, so they forward to a single [HalPort],
//! that has to be bound with [bind] or [install] before the host driver is started. Calling any
//! of them before that is a bug and panics.
#![allow(non_snake_case)]

use core::{
    cell::Cell,
    ffi::{c_char, c_int, c_void},
    slice,
};

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::{digital::OutputPin, spi::SpiBus};
use static_cell::StaticCell;

use crate::{
    board::{Cc3100, IrqHandler},
    ffi::{
        cs_sl_fd_t, SlDeviceEvent_t, SlHttpServerEvent_t, SlHttpServerResponse_t,
        SlNetAppEvent_t, SlSockEvent_t, SlWlanEvent_t,
    },
    stack::{NetAppEvent, SlEventHandler, WlanEvent},
    SlError, SlResult,
};

/// The operations the HAL callback table forwards to.
pub trait HalPort: SlEventHandler + Sync {
    fn device_enable(&self);
    fn device_disable(&self);
    fn if_read(&self, buffer: &mut [u8]) -> SlResult<usize>;
    fn if_write(&self, buffer: &[u8]) -> SlResult<usize>;
    fn mask_int(&self);
    fn unmask_int(&self);
    /// Register the interrupt handler. `None` unregisters the current one.
    fn register_int_handler(&self, handler: Option<IrqHandler>);
}
impl<M, SPI, CS, NHIB> HalPort for Cc3100<M, SPI, CS, NHIB>
where
    M: RawMutex,
    SPI: SpiBus<u8>,
    CS: OutputPin,
    NHIB: OutputPin,
    Self: Sync,
{
    fn device_enable(&self) {
        if let Err(err) = self.enable() {
            error!("Enabling the NWP failed: {}", err);
        }
    }
    fn device_disable(&self) {
        if let Err(err) = self.disable() {
            error!("Disabling the NWP failed: {}", err);
        }
    }
    fn if_read(&self, buffer: &mut [u8]) -> SlResult<usize> {
        self.read(buffer)
    }
    fn if_write(&self, buffer: &[u8]) -> SlResult<usize> {
        self.write(buffer)
    }
    fn mask_int(&self) {
        self.mask_irq();
    }
    fn unmask_int(&self) {
        self.unmask_irq();
    }
    fn register_int_handler(&self, handler: Option<IrqHandler>) {
        match handler {
            Some(handler) => self.register_interrupt_handler(handler),
            None => self.unregister_interrupt_handler(),
        }
    }
}

static BOUND_PORT: Mutex<Cell<Option<&'static dyn HalPort>>> = Mutex::new(Cell::new(None));

/// Bind the port, that the callback table forwards to.
///
/// This can only be done once. Any further attempt fails with [SlError::AlreadyBound].
pub fn bind(port: &'static dyn HalPort) -> SlResult<()> {
    critical_section::with(|cs| {
        let bound_port = BOUND_PORT.borrow(cs);
        if bound_port.get().is_some() {
            return Err(SlError::AlreadyBound);
        }
        bound_port.set(Some(port));
        trace!("HAL port bound.");
        Ok(())
    })
}

/// Move the port into `cell` and [bind] it.
pub fn install<P: HalPort + 'static>(
    cell: &'static StaticCell<P>,
    port: P,
) -> SlResult<&'static P> {
    let Some(port) = cell.try_init(port) else {
        return Err(SlError::AlreadyBound);
    };
    let port: &'static P = port;
    bind(port)?;
    Ok(port)
}

/// The currently bound port, if any.
pub fn bound_port() -> Option<&'static dyn HalPort> {
    critical_section::with(|cs| BOUND_PORT.borrow(cs).get())
}

fn port() -> &'static dyn HalPort {
    match bound_port() {
        Some(port) => port,
        None => panic!("SimpleLink HAL callback invoked, before a port was bound."),
    }
}

#[no_mangle]
pub extern "C" fn slhal_DeviceEnablePreamble() {}

#[no_mangle]
pub extern "C" fn slhal_DeviceEnable() {
    port().device_enable();
}

#[no_mangle]
pub extern "C" fn slhal_DeviceDisable() {
    port().device_disable();
}

/// There's only one interface, so this always returns the same dummy descriptor.
#[no_mangle]
pub extern "C" fn slhal_IfOpen(_ifname: *const c_char, _flags: c_int) -> cs_sl_fd_t {
    1
}

#[no_mangle]
pub extern "C" fn slhal_IfClose(_fd: cs_sl_fd_t) -> c_int {
    0
}

/// # Safety
/// `buffer` must be valid for writes of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn slhal_IfRead(_fd: cs_sl_fd_t, buffer: *mut u8, len: c_int) -> c_int {
    let port = port();
    if buffer.is_null() || len < 0 {
        return -1;
    }
    let buffer = unsafe { slice::from_raw_parts_mut(buffer, len as usize) };
    match port.if_read(buffer) {
        Ok(read) => read as c_int,
        Err(_) => -1,
    }
}

/// # Safety
/// `buffer` must be valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn slhal_IfWrite(_fd: cs_sl_fd_t, buffer: *const u8, len: c_int) -> c_int {
    let port = port();
    if buffer.is_null() || len < 0 {
        return -1;
    }
    let buffer = unsafe { slice::from_raw_parts(buffer, len as usize) };
    match port.if_write(buffer) {
        Ok(written) => written as c_int,
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn slhal_IfMaskIntHdlr() {
    port().mask_int();
}

#[no_mangle]
pub extern "C" fn slhal_IfUnMaskIntHdlr() {
    port().unmask_int();
}

/// The context pointer is ignored, since the handler is called without arguments.
#[no_mangle]
pub extern "C" fn slhal_IfRegIntHdlr(handler: Option<IrqHandler>, _value: *mut c_void) -> c_int {
    port().register_int_handler(handler);
    0
}

/// # Safety
/// `event` must be null or point to a valid event.
#[no_mangle]
pub unsafe extern "C" fn slhal_GeneralEvtHdlr(event: *const SlDeviceEvent_t) {
    if let (Some(port), Some(event)) = (bound_port(), unsafe { event.as_ref() }) {
        port.device_event(event.Event);
    }
}

/// # Safety
/// `event` must be null or point to a valid event.
#[no_mangle]
pub unsafe extern "C" fn slhal_WlanEvtHdlr(event: *const SlWlanEvent_t) {
    let port = port();
    if let Some(event) = unsafe { event.as_ref() } {
        port.wlan_event(WlanEvent::from(event));
    }
}

/// # Safety
/// `event` must be null or point to a valid event.
#[no_mangle]
pub unsafe extern "C" fn slhal_NetAppEvtHdlr(event: *const SlNetAppEvent_t) {
    let port = port();
    if let Some(event) = unsafe { event.as_ref() } {
        port.netapp_event(NetAppEvent::from(event));
    }
}

/// We don't run the HTTP server, so there's nothing to do here.
#[no_mangle]
pub extern "C" fn slhal_HttpServerCallback(
    _event: *mut SlHttpServerEvent_t,
    _response: *mut SlHttpServerResponse_t,
) {
}

/// # Safety
/// `event` must be null or point to a valid event.
#[no_mangle]
pub unsafe extern "C" fn slhal_SockEvtHdlr(event: *const SlSockEvent_t) {
    if let (Some(port), Some(event)) = (bound_port(), unsafe { event.as_ref() }) {
        port.sock_event(event.Event);
    }
}
