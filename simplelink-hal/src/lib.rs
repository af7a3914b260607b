//! # `simplelink-hal`
//! This is a platform adaptation of the SimpleLink host driver for the CC3100 WiFi network
//! processor (NWP). It supplies the hardware specific side of the host driver, on top of
//! `embedded-hal`, and offers a small WiFi management interface to the application.
//! ## Overview
//!
//! ### The driver
//! [Cc3100] owns the SPI bus, the chip select line and the nHIB line, which takes the NWP in and
//! out of hibernation. It also caches the network state the NWP reports through events, like the
//! acquired IP address. Every operation takes `&self`, since the driver is shared between three
//! parties: the host driver calling back into it, the interrupt handler of the board and the
//! application.
//!
//! ### Interrupts
//! The NWP signals pending data with a rising edge on its interrupt line. The board forwards
//! these edges to [Cc3100::on_irq_edge]. By default, that calls the handler registered by the
//! host driver right away, which the non-OS host driver relies on, since it busy waits inside
//! its API calls. With [IrqDispatch::Deferred], edges are only recorded and the handler is
//! called outside of interrupt context, either by [Cc3100::dispatch_irq] or by the
//! [Cc3100::service_interrupts] task. This only works if that runs while the host driver waits,
//! for example in another thread. Masking the interrupt through the host driver holds edges back
//! until it's unmasked again.
//!
//! ### The callback table
//! The host driver expects a fixed set of C functions, most of which have no context argument.
//! The [hal_table] module provides them as trampolines into a single bound [HalPort], which is
//! usually the [Cc3100]. Binding can only happen once.
//!
//! ### The interface
//! [SimpleLinkInterface] implements [WifiInterface] on top of the driver. Connecting issues the
//! connect request and then runs the event loop of the host driver, until an IP address was
//! acquired, the connection failed or the configured timeout elapsed. Scanning, disconnecting
//! and providing an IP stack aren't supported.
//!
//! ### Sockets
//! The [socket] module maps the BSD socket names to their SimpleLink counterparts.

#![cfg_attr(not(test), no_std)]
#[macro_use]
pub(crate) mod fmt;

mod board;
pub mod ffi;
pub mod hal_table;
mod interface;
pub mod socket;
mod stack;
mod sync;

use core::fmt::{Display, Formatter};

pub use board::*;
pub use hal_table::HalPort;
pub use interface::*;
pub use stack::*;
pub use sync::LinkState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlError {
    /// A SPI transfer failed.
    Bus,
    /// Driving chip select or nHIB failed.
    Pin,
    /// The host driver returned a negative status code.
    Vendor(i16),
    /// A port was already bound to the HAL callback table.
    AlreadyBound,
    /// Connecting was requested, before credentials were set.
    NoCredentials,
    /// The SSID is empty or longer than 32 bytes, or the passphrase is longer than 64 bytes.
    InvalidCredentials,
    /// The NWP reported, that the connection failed.
    ConnectFailed,
    /// No IP address was acquired in time.
    Timeout,
    /// This operation isn't supported by this integration.
    Unsupported,
}
impl Display for SlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus => f.write_str("SPI transfer failed"),
            Self::Pin => f.write_str("driving a GPIO failed"),
            Self::Vendor(code) => write!(f, "host driver returned {code}"),
            Self::AlreadyBound => f.write_str("a port is already bound"),
            Self::NoCredentials => f.write_str("no credentials set"),
            Self::InvalidCredentials => f.write_str("invalid SSID or passphrase"),
            Self::ConnectFailed => f.write_str("connecting failed"),
            Self::Timeout => f.write_str("timed out waiting for an IP address"),
            Self::Unsupported => f.write_str("unsupported operation"),
        }
    }
}

pub type SlResult<T> = Result<T, SlError>;
