//! The vendor side of the adaptation.
//!
//! The [SimpleLink] trait is the small slice of the SimpleLink host driver API, that the board
//! driver and the interface need. With the `simplelink-ffi` feature enabled, [VendorStack]
//! implements it by calling into the real host driver.
use core::net::Ipv4Addr;

use macro_bits::serializable_enum;

use crate::ffi::{
    SlNetAppEvent_t, SlWlanEvent_t, SL_NETAPP_IPV4_IPACQUIRED_EVENT, SL_WLAN_CONNECT_EVENT,
    SL_WLAN_DISCONNECT_EVENT,
};

serializable_enum! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    /// The security types understood by the NWP.
    pub enum SecurityType: u8 {
        Open => 0,
        Wep => 1,
        #[default]
        WpaWpa2 => 2,
        WpsPbc => 3,
        WpsPin => 4,
        WpaEnterprise => 5
    }
}

/// The security parameters passed along with a connect request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecParams<'a> {
    pub security: SecurityType,
    /// The passphrase or key. Empty for open networks.
    pub key: &'a [u8],
}

/// An asynchronous WLAN event reported by the NWP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WlanEvent {
    /// We're associated with the AP.
    Connect,
    /// The association was lost, or never came to be.
    Disconnect,
    /// Any other event code. These are logged and ignored.
    Other(u32),
}
impl From<&SlWlanEvent_t> for WlanEvent {
    fn from(event: &SlWlanEvent_t) -> Self {
        match event.Event {
            SL_WLAN_CONNECT_EVENT => Self::Connect,
            SL_WLAN_DISCONNECT_EVENT => Self::Disconnect,
            code => Self::Other(code),
        }
    }
}

/// An asynchronous network application event reported by the NWP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetAppEvent {
    /// DHCP finished and we got an IPv4 configuration.
    Ipv4Acquired {
        ip: Ipv4Addr,
        gateway: Ipv4Addr,
        dns: Ipv4Addr,
    },
    /// Any other event code. These are logged and ignored.
    Other(u32),
}
impl From<&SlNetAppEvent_t> for NetAppEvent {
    fn from(event: &SlNetAppEvent_t) -> Self {
        match event.Event {
            SL_NETAPP_IPV4_IPACQUIRED_EVENT => Self::Ipv4Acquired {
                ip: Ipv4Addr::from(event.ipAcquiredV4.ip),
                gateway: Ipv4Addr::from(event.ipAcquiredV4.gateway),
                dns: Ipv4Addr::from(event.ipAcquiredV4.dns),
            },
            code => Self::Other(code),
        }
    }
}

/// Receives the asynchronous events of the host driver.
pub trait SlEventHandler {
    fn wlan_event(&self, event: WlanEvent);
    fn netapp_event(&self, event: NetAppEvent);
    /// General device events. We don't act on any of them.
    fn device_event(&self, _code: u32) {}
    /// Socket events. Sockets aren't supported through this integration.
    fn sock_event(&self, _code: u32) {}
}

/// The parts of the SimpleLink host driver API we call into.
///
/// All functions return the raw status code of the host driver, where negative values are
/// errors.
pub trait SimpleLink {
    /// Initialize the host driver and the NWP. Returns the role the NWP started in.
    fn start(&self) -> i16;
    /// Read the MAC address of the NWP.
    fn get_mac_address(&self, mac: &mut [u8; 6]) -> i16;
    /// Issue a connect request. This doesn't wait for the connection to be established.
    fn wlan_connect(&self, ssid: &[u8], bssid: Option<&[u8; 6]>, sec_params: &SecParams<'_>)
        -> i16;
    /// Run the non-OS event loop of the host driver once.
    ///
    /// The real host driver reports events through the C callback table, so it ignores `events`.
    /// Other implementations deliver their events to `events` directly.
    fn run_event_task(&self, events: &dyn SlEventHandler);
}
impl<T: SimpleLink + ?Sized> SimpleLink for &T {
    fn start(&self) -> i16 {
        (**self).start()
    }
    fn get_mac_address(&self, mac: &mut [u8; 6]) -> i16 {
        (**self).get_mac_address(mac)
    }
    fn wlan_connect(
        &self,
        ssid: &[u8],
        bssid: Option<&[u8; 6]>,
        sec_params: &SecParams<'_>,
    ) -> i16 {
        (**self).wlan_connect(ssid, bssid, sec_params)
    }
    fn run_event_task(&self, events: &dyn SlEventHandler) {
        (**self).run_event_task(events)
    }
}

#[cfg(feature = "simplelink-ffi")]
pub use vendor::VendorStack;

#[cfg(feature = "simplelink-ffi")]
mod vendor {
    use core::ptr::{null, null_mut};

    use super::{SecParams, SimpleLink, SlEventHandler};
    use crate::ffi::{self, SlSecParams_t, SL_MAC_ADDRESS_GET};

    /// The real SimpleLink host driver, linked in through FFI.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct VendorStack;
    impl SimpleLink for VendorStack {
        fn start(&self) -> i16 {
            unsafe { ffi::sl_Start(null(), null_mut(), None) }
        }
        fn get_mac_address(&self, mac: &mut [u8; 6]) -> i16 {
            let mut mac_len = mac.len() as u8;
            let res = unsafe {
                ffi::sl_NetCfgGet(
                    SL_MAC_ADDRESS_GET,
                    null_mut(),
                    &mut mac_len,
                    mac.as_mut_ptr(),
                )
            };
            res.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        }
        fn wlan_connect(
            &self,
            ssid: &[u8],
            bssid: Option<&[u8; 6]>,
            sec_params: &SecParams<'_>,
        ) -> i16 {
            let raw_sec_params = SlSecParams_t {
                Type: sec_params.security.into_bits(),
                Key: sec_params.key.as_ptr() as *const i8,
                KeyLen: sec_params.key.len() as u8,
            };
            unsafe {
                ffi::sl_WlanConnect(
                    ssid.as_ptr() as *const i8,
                    ssid.len() as i16,
                    bssid.map_or(null(), |bssid| bssid.as_ptr()),
                    &raw_sec_params,
                    null(),
                )
            }
        }
        fn run_event_task(&self, _events: &dyn SlEventHandler) {
            // The host driver calls the event handlers in the callback table itself.
            unsafe {
                ffi::_SlNonOsMainLoopTask();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::SlIpV4AcquiredAsync_t;

    #[test]
    fn wlan_events_are_decoded() {
        assert_eq!(
            WlanEvent::from(&SlWlanEvent_t { Event: 1 }),
            WlanEvent::Connect
        );
        assert_eq!(
            WlanEvent::from(&SlWlanEvent_t { Event: 2 }),
            WlanEvent::Disconnect
        );
        assert_eq!(
            WlanEvent::from(&SlWlanEvent_t { Event: 7 }),
            WlanEvent::Other(7)
        );
    }

    #[test]
    fn ip_acquired_event_is_decoded_in_host_order() {
        let raw = SlNetAppEvent_t {
            Event: SL_NETAPP_IPV4_IPACQUIRED_EVENT,
            ipAcquiredV4: SlIpV4AcquiredAsync_t {
                ip: 0xc0a8_0164,
                gateway: 0xc0a8_0101,
                dns: 0x0808_0808,
            },
        };
        assert_eq!(
            NetAppEvent::from(&raw),
            NetAppEvent::Ipv4Acquired {
                ip: Ipv4Addr::new(192, 168, 1, 100),
                gateway: Ipv4Addr::new(192, 168, 1, 1),
                dns: Ipv4Addr::new(8, 8, 8, 8),
            }
        );
    }

    #[test]
    fn security_types_use_vendor_codes() {
        assert_eq!(SecurityType::Open.into_bits(), 0);
        assert_eq!(SecurityType::WpaWpa2.into_bits(), 2);
        assert_eq!(SecurityType::default(), SecurityType::WpaWpa2);
    }
}
