//! Command and status code tables.
//!
//! Command codes occupy the contiguous block `COMMAND_MIN..COMMAND_MAX`.
//! Code 0 means "no command" and is never valid on the wire.

use std::fmt;

use crate::error::FrameError;

/// Lowest valid command code.
pub const COMMAND_MIN: u8 = 1;

/// Sentinel one past the highest valid command code.
pub const COMMAND_MAX: u8 = 9;

/// Side-channel request/response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Do a soft reset of the device.
    SoftReset = 1,
    /// Wait until all pending output has been sent to the device.
    DrainOutput = 2,
    /// Ask whether the connection is bidirectional.
    GetBidi = 3,
    /// Fetch the IEEE 1284 device ID string.
    GetDeviceId = 4,
    /// Fetch the device state bitmask.
    GetState = 5,
    /// Query the value of one SNMP OID.
    SnmpGet = 6,
    /// Query the OID following the given one.
    SnmpGetNext = 7,
    /// Ask whether the device is connected.
    GetConnected = 8,
}

impl Command {
    /// All commands in code order.
    pub const ALL: [Command; 8] = [
        Command::SoftReset,
        Command::DrainOutput,
        Command::GetBidi,
        Command::GetDeviceId,
        Command::GetState,
        Command::SnmpGet,
        Command::SnmpGetNext,
        Command::GetConnected,
    ];

    /// Look up a command by wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        if !(COMMAND_MIN..COMMAND_MAX).contains(&code) {
            return None;
        }
        Some(Self::ALL[usize::from(code - COMMAND_MIN)])
    }

    /// Wire code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable lowercase name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Command::SoftReset => "soft-reset",
            Command::DrainOutput => "drain-output",
            Command::GetBidi => "get-bidi",
            Command::GetDeviceId => "get-device-id",
            Command::GetState => "get-state",
            Command::SnmpGet => "snmp-get",
            Command::SnmpGetNext => "snmp-get-next",
            Command::GetConnected => "get-connected",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = FrameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(FrameError::InvalidCommand(code))
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command.as_u8()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome codes carried in the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// Placeholder sent with requests; never a final outcome.
    None = 0,
    /// Operation succeeded.
    Ok = 1,
    /// An I/O error occurred.
    IoError = 2,
    /// The operation timed out.
    Timeout = 3,
    /// The device did not respond.
    NoResponse = 4,
    /// The message was malformed.
    BadMessage = 5,
    /// The response would not fit the destination.
    TooBig = 6,
    /// The command is not supported by the backend.
    NotImplemented = 7,
}

impl Status {
    /// Look up a status by wire code.
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Status::None,
            1 => Status::Ok,
            2 => Status::IoError,
            3 => Status::Timeout,
            4 => Status::NoResponse,
            5 => Status::BadMessage,
            6 => Status::TooBig,
            7 => Status::NotImplemented,
            _ => return None,
        })
    }

    /// Wire code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true only for [`Status::Ok`].
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// Stable lowercase name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Status::None => "none",
            Status::Ok => "ok",
            Status::IoError => "io-error",
            Status::Timeout => "timeout",
            Status::NoResponse => "no-response",
            Status::BadMessage => "bad-message",
            Status::TooBig => "too-big",
            Status::NotImplemented => "not-implemented",
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = FrameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(FrameError::InvalidStatus(code))
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.as_u8()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
