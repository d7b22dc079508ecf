//! Timeout-bounded descriptor I/O.
//!
//! This is the lowest layer of sidechan. It provides:
//! - [`wait_ready`]: wait for a descriptor to become readable or writable
//! - [`Channel`]: single-attempt reads and complete writes bounded by a timeout
//! - [`BackChannel`]: the unframed status byte stream built on [`Channel`]
//!
//! Descriptors are always supplied by the caller. Nothing here opens,
//! discovers or closes an endpoint on its own.

pub mod error;

#[cfg(unix)]
pub mod backchannel;
#[cfg(unix)]
pub mod channel;
#[cfg(unix)]
pub mod wait;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use backchannel::BackChannel;
#[cfg(unix)]
pub use channel::Channel;
#[cfg(unix)]
pub use wait::{is_transient, retry_transient, wait_ready, Interest, Readiness};
