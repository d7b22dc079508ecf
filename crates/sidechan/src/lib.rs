//! Printer side-channel and back-channel protocol.
//!
//! A print filter talks to its backend over two inherited descriptors: the
//! framed side channel for device queries (state, device ID, SNMP lookups
//! and walks) and the unframed back channel for raw status bytes.
//!
//! # Crate Structure
//!
//! - [`transport`]: readiness waits and timeout-bounded descriptor I/O
//! - [`frame`]: command and status codes, frame codec, message reader/writer
//! - [`peer`]: request/response, SNMP get and walk, backend responder
//!   (behind the `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use sidechan_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sidechan_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use sidechan_peer::*;
}
