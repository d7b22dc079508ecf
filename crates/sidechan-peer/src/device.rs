//! Typed device requests.
//!
//! Each request carries an empty payload. The ok response layouts are:
//! one bitmask byte for get-state, one flag byte for get-bidi and
//! get-connected, the raw IEEE 1284 string for get-device-id, and nothing
//! for soft-reset and drain-output.

use std::io::{Read, Write};
use std::os::fd::AsFd;

use bytes::Bytes;
use sidechan_frame::Command;

use crate::error::{Result, SideChannelError};
use crate::side_channel::SideChannel;

bitflags::bitflags! {
    /// Device state reported by get-state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceState: u8 {
        const OFFLINE = 0x01;
        const BUSY = 0x02;
        const ERROR = 0x04;
        const MARKER_LOW = 0x10;
        const MARKER_EMPTY = 0x20;
        const MEDIA_LOW = 0x40;
        const MEDIA_EMPTY = 0x80;
    }
}

impl DeviceState {
    /// True when no condition bit is set.
    pub fn is_online(self) -> bool {
        self.is_empty()
    }
}

/// Whether the connection to the device is bidirectional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bidi {
    NotSupported,
    Supported,
}

impl Bidi {
    fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Bidi::NotSupported),
            1 => Some(Bidi::Supported),
            _ => None,
        }
    }
}

impl<T: AsFd + Read + Write> SideChannel<T> {
    /// Ask the backend to soft-reset the device.
    pub fn soft_reset(&mut self) -> Result<()> {
        self.request_ok(Command::SoftReset).map(drop)
    }

    /// Block until the backend has sent all pending output to the device.
    pub fn drain_output(&mut self) -> Result<()> {
        self.request_ok(Command::DrainOutput).map(drop)
    }

    /// Ask whether the device connection is bidirectional.
    pub fn get_bidi(&mut self) -> Result<Bidi> {
        let code = self.request_byte(Command::GetBidi)?;
        Bidi::from_u8(code)
            .ok_or_else(|| SideChannelError::bad_message(format!("unknown bidi value {code}")))
    }

    /// Fetch the IEEE 1284 device ID string.
    pub fn get_device_id(&mut self) -> Result<String> {
        let payload = self.request_ok(Command::GetDeviceId)?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Fetch the device state.
    ///
    /// Unknown bits are kept so callers can still inspect them.
    pub fn get_state(&mut self) -> Result<DeviceState> {
        let bits = self.request_byte(Command::GetState)?;
        Ok(DeviceState::from_bits_retain(bits))
    }

    /// Ask whether the device is connected.
    pub fn get_connected(&mut self) -> Result<bool> {
        match self.request_byte(Command::GetConnected)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SideChannelError::bad_message(format!(
                "unknown connected value {other}"
            ))),
        }
    }

    fn request_ok(&mut self, command: Command) -> Result<Bytes> {
        let response = self.do_request(command, b"")?;
        if !response.status.is_ok() {
            return Err(SideChannelError::Status(response.status));
        }
        Ok(response.payload)
    }

    fn request_byte(&mut self, command: Command) -> Result<u8> {
        let payload = self.request_ok(command)?;
        payload
            .first()
            .copied()
            .ok_or_else(|| SideChannelError::bad_message(format!("empty {command} response")))
    }
}
