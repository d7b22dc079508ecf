//! Side-channel message framing.
//!
//! Every message is framed with a fixed 4-byte header:
//! - A 1-byte command code
//! - A 1-byte status code
//! - A 2-byte big-endian payload length
//!
//! Length fields come from the peer and are never trusted: decoding rejects
//! rather than truncates whenever the declared length disagrees with the
//! destination capacity or the bytes actually received.

pub mod codec;
pub mod command;
pub mod error;
#[cfg(unix)]
pub mod reader;
#[cfg(unix)]
pub mod writer;

pub use codec::{
    decode_frame, decode_message, encode_frame, encode_request, Decoded, Message, HEADER_SIZE,
    MAX_FRAME, MAX_PAYLOAD,
};
pub use command::{Command, Status, COMMAND_MAX, COMMAND_MIN};
pub use error::{FrameError, Result};
#[cfg(unix)]
pub use reader::MessageReader;
#[cfg(unix)]
pub use writer::MessageWriter;
