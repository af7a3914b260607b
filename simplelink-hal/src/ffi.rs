//! Bindings to the parts of the SimpleLink host driver API, that we use.
//!
//! Only the prefixes of the event structures we actually read are declared. The NWP always
//! hands us pointers to the full structures, so reading a prefix is fine.
#![allow(non_snake_case, non_camel_case_types)]

#[cfg(feature = "simplelink-ffi")]
use core::ffi::{c_char, c_void};

pub type _i8 = i8;
pub type _u8 = u8;
pub type _i16 = i16;
pub type _i32 = i32;
pub type _u32 = u32;

/// The handle returned by `IfOpen`. We only ever have one interface, so it's ignored.
pub type cs_sl_fd_t = i32;

/// The interrupt handler the host driver registers through `IfRegIntHdlr`.
pub type SL_P_EVENT_HANDLER = extern "C" fn();

pub const SL_MAC_ADDRESS_GET: _u8 = 2;

pub const SL_WLAN_CONNECT_EVENT: _u32 = 1;
pub const SL_WLAN_DISCONNECT_EVENT: _u32 = 2;
pub const SL_NETAPP_IPV4_IPACQUIRED_EVENT: _u32 = 1;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlSecParams_t {
    pub Type: _u8,
    pub Key: *const _i8,
    pub KeyLen: _u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlWlanEvent_t {
    pub Event: _u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlIpV4AcquiredAsync_t {
    pub ip: _u32,
    pub gateway: _u32,
    pub dns: _u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlNetAppEvent_t {
    pub Event: _u32,
    pub ipAcquiredV4: SlIpV4AcquiredAsync_t,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlDeviceEvent_t {
    pub Event: _u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SlSockEvent_t {
    pub Event: _u32,
}

/// We don't serve HTTP, so this is opaque.
#[repr(C)]
pub struct SlHttpServerEvent_t {
    _private: [u8; 0],
}

/// We don't serve HTTP, so this is opaque.
#[repr(C)]
pub struct SlHttpServerResponse_t {
    _private: [u8; 0],
}

#[cfg(feature = "simplelink-ffi")]
extern "C" {
    pub fn sl_Start(
        pIfHdl: *const c_void,
        pDevName: *mut c_char,
        pInitCallBack: Option<extern "C" fn(_u32)>,
    ) -> _i16;
    pub fn sl_NetCfgGet(
        ConfigId: _u8,
        pConfigOpt: *mut _u8,
        pConfigLen: *mut _u8,
        pValues: *mut _u8,
    ) -> _i32;
    pub fn sl_WlanConnect(
        pName: *const _i8,
        NameLen: _i16,
        pMacAddr: *const _u8,
        pSecParams: *const SlSecParams_t,
        pSecExtParams: *const c_void,
    ) -> _i16;
    pub fn _SlNonOsMainLoopTask() -> _i16;
}
