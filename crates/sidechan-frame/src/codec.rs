use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::command::{Command, Status};
use crate::error::{FrameError, Result};

/// Message header: command (1) + status (1) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Largest complete message on the wire.
pub const MAX_FRAME: usize = HEADER_SIZE + MAX_PAYLOAD;

/// A decoded side-channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub command: Command,
    pub status: Status,
    pub payload: Bytes,
}

impl Message {
    /// Create a new message.
    pub fn new(command: Command, status: Status, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            status,
            payload: payload.into(),
        }
    }

    /// Create a request: the status byte carries the `None` placeholder.
    pub fn request(command: Command, payload: impl Into<Bytes>) -> Self {
        Self::new(command, Status::None, payload)
    }

    /// The total wire size of this message (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append the wire form of this message to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        encode_frame(self.command.as_u8(), self.status, &self.payload, dst)
    }
}

/// Header fields and payload length reported by [`decode_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub command: Command,
    pub status: Status,
    /// Payload bytes written to the destination buffer.
    pub len: usize,
}

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬─────────────┬──────────────────┐
/// │ Command   │ Status   │ Length      │ Payload          │
/// │ (1B)      │ (1B)     │ (2B BE)     │ (Length bytes)   │
/// └───────────┴──────────┴─────────────┴──────────────────┘
/// ```
///
/// Nothing is appended to `dst` when the command code or payload length is
/// rejected.
pub fn encode_frame(command: u8, status: Status, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let command = Command::try_from(command)?;
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(command.as_u8());
    dst.put_u8(status.as_u8());
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a request, which always carries the `None` status placeholder.
pub fn encode_request(command: Command, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_frame(command.as_u8(), Status::None, payload, dst)
}

/// Decode one message from `src` into `dest`.
///
/// `src` is exactly what was received. The declared payload length is
/// checked against both the bytes actually present after the header and
/// the capacity of `dest`; on success exactly that many bytes are copied to
/// the front of `dest`. A non-empty payload with no destination is rejected.
pub fn decode_frame(src: &[u8], dest: Option<&mut [u8]>) -> Result<Decoded> {
    if src.len() < HEADER_SIZE {
        debug!(received = src.len(), "rejecting truncated message");
        return Err(FrameError::Truncated {
            received: src.len(),
        });
    }

    let command = Command::try_from(src[0]).inspect_err(|_| {
        debug!(code = src[0], "rejecting message with invalid command");
    })?;

    let declared = usize::from(u16::from_be_bytes([src[2], src[3]]));
    let received = src.len() - HEADER_SIZE;

    let dest: &mut [u8] = match dest {
        Some(dest) => dest,
        None if declared > 0 => return Err(FrameError::MissingBuffer { declared }),
        None => &mut [],
    };
    if declared > dest.len() {
        debug!(%command, declared, capacity = dest.len(), "payload exceeds destination");
        return Err(FrameError::PayloadTooLarge {
            size: declared,
            max: dest.len(),
        });
    }
    if declared > received {
        debug!(%command, declared, received, "payload exceeds received bytes");
        return Err(FrameError::LengthExceedsReceived { declared, received });
    }

    let status = Status::try_from(src[1])?;

    dest[..declared].copy_from_slice(&src[HEADER_SIZE..HEADER_SIZE + declared]);
    Ok(Decoded {
        command,
        status,
        len: declared,
    })
}

/// Decode one message into an owned [`Message`], accepting at most
/// `max_payload` payload bytes.
pub fn decode_message(src: &[u8], max_payload: usize) -> Result<Message> {
    let capacity = max_payload
        .min(MAX_PAYLOAD)
        .min(src.len().saturating_sub(HEADER_SIZE));
    let mut payload = BytesMut::zeroed(capacity);

    let decoded = match decode_frame(src, Some(&mut payload)) {
        // Report the caller's limit, not the internal buffer size.
        Err(FrameError::PayloadTooLarge { size, .. }) if size > max_payload => {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: max_payload,
            })
        }
        Err(FrameError::PayloadTooLarge { size, .. }) => {
            return Err(FrameError::LengthExceedsReceived {
                declared: size,
                received: src.len().saturating_sub(HEADER_SIZE),
            })
        }
        other => other?,
    };

    payload.truncate(decoded.len);
    Ok(Message {
        command: decoded.command,
        status: decoded.status,
        payload: payload.freeze(),
    })
}
