//! The BSD socket names, mapped to their SimpleLink counterparts.
//!
//! Code written against the BSD names can import this module and use the SimpleLink socket API
//! without further changes. Unlike the preprocessor renaming in the vendor headers, this only
//! applies where the module is imported. `timeval` is left alone, since the platform usually
//! defines it already.
#![allow(non_camel_case_types, non_snake_case)]

use crate::SlResult;

pub type SlSocklen_t = u32;

pub const SL_AF_INET: u16 = 2;
pub const SL_AF_INET6: u16 = 3;
pub const SL_SOCK_STREAM: i16 = 1;
pub const SL_SOCK_DGRAM: i16 = 2;
pub const SL_INADDR_ANY: u32 = 0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlSockAddr_t {
    pub sa_family: u16,
    pub sa_data: [u8; 14],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlInAddr_t {
    /// The address in network byte order.
    pub s_addr: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlSockAddrIn_t {
    pub sin_family: u16,
    /// The port in network byte order.
    pub sin_port: u16,
    pub sin_addr: SlInAddr_t,
    pub sin_zero: [u8; 8],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlIn6Addr_t {
    pub s6_addr32: [u32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlSockAddrIn6_t {
    pub sin6_family: u16,
    pub sin6_port: u16,
    pub sin6_flowinfo: u32,
    pub sin6_addr: SlIn6Addr_t,
    pub sin6_scope_id: u32,
}

pub type socklen_t = SlSocklen_t;
pub type sockaddr = SlSockAddr_t;
pub type in6_addr = SlIn6Addr_t;
pub type sockaddr_in6 = SlSockAddrIn6_t;
pub type in_addr = SlInAddr_t;
pub type sockaddr_in = SlSockAddrIn_t;

pub const SOCK_STREAM: i16 = SL_SOCK_STREAM;
pub const SOCK_DGRAM: i16 = SL_SOCK_DGRAM;

pub const AF_INET: u16 = SL_AF_INET;
pub const AF_INET6: u16 = SL_AF_INET6;
pub const INADDR_ANY: u32 = SL_INADDR_ANY;

pub const fn sl_Htonl(val: u32) -> u32 {
    val.to_be()
}
pub const fn sl_Ntohl(val: u32) -> u32 {
    u32::from_be(val)
}
pub const fn sl_Htons(val: u16) -> u16 {
    val.to_be()
}
pub const fn sl_Ntohs(val: u16) -> u16 {
    u16::from_be(val)
}

pub use self::sl_Htonl as htonl;
pub use self::sl_Htons as htons;
pub use self::sl_Ntohl as ntohl;
pub use self::sl_Ntohs as ntohs;

/// A full IP stack, offering sockets.
///
/// The NWP has one, but this crate only manages the WiFi link, so
/// [WifiInterface::network_stack](crate::WifiInterface::network_stack) never returns one.
pub trait NetworkStack {
    /// Open a socket, returning its descriptor.
    fn socket(&self, domain: u16, socket_type: i16, protocol: i16) -> SlResult<i16>;
}

#[cfg(test)]
mod tests {
    use core::mem::size_of;

    use super::*;

    #[test]
    fn layouts_match_the_host_driver() {
        assert_eq!(size_of::<sockaddr>(), 16);
        assert_eq!(size_of::<sockaddr_in>(), 16);
        assert_eq!(size_of::<in6_addr>(), 16);
        assert_eq!(size_of::<sockaddr_in6>(), 28);
    }

    #[test]
    fn byte_order_conversions() {
        assert_eq!(htonl(0x0102_0304).to_ne_bytes(), [1, 2, 3, 4]);
        assert_eq!(htons(0x1f90).to_ne_bytes(), [0x1f, 0x90]);
        assert_eq!(ntohl(htonl(0xc0a8_0101)), 0xc0a8_0101);
        assert_eq!(ntohs(htons(80)), 80);
    }

    #[test]
    fn bsd_names_alias_the_vendor_names() {
        let addr = sockaddr_in {
            sin_family: AF_INET,
            sin_port: htons(80),
            sin_addr: in_addr {
                s_addr: htonl(INADDR_ANY),
            },
            ..Default::default()
        };
        assert_eq!(addr.sin_family, SL_AF_INET);
        assert_eq!(SOCK_STREAM, SL_SOCK_STREAM);
        assert_eq!(SOCK_DGRAM, SL_SOCK_DGRAM);
        assert_eq!(AF_INET6, SL_AF_INET6);
    }
}
