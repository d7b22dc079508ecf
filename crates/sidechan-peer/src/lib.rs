//! Side-channel request/response on top of the framing layer.
//!
//! A filter or driver holds a [`SideChannel`] and asks the backend for
//! device-level information: typed requests ([`SideChannel::get_state`] and
//! friends), single SNMP lookups ([`SideChannel::snmp_get`]) and subtree
//! walks ([`SideChannel::snmp_walk`]). The backend end of the same channel
//! answers with [`SideChannel::serve`] and a [`RequestHandler`].
//!
//! Requests are strictly one at a time: every call writes one request and
//! reads its response before returning.

pub mod config;
pub mod device;
pub mod emulator;
pub mod error;
pub mod mib;
pub mod responder;
pub mod side_channel;
pub mod snmp;

#[cfg(test)]
mod testing;

pub use config::{SideChannelConfig, DEFAULT_TIMEOUT};
pub use device::{Bidi, DeviceState};
pub use emulator::{Emulator, EmulatorConfig};
pub use error::{MibError, Result, SideChannelError};
pub use mib::{MibTable, MibValue, Oid};
pub use responder::{Reply, Request, RequestHandler};
pub use side_channel::SideChannel;
pub use snmp::{SnmpValue, SnmpWalk};

pub use sidechan_frame::{Command, Message, Status};
