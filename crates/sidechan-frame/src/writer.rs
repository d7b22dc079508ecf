use std::io::Write;
use std::os::fd::AsFd;
use std::time::Duration;

use bytes::BytesMut;
use sidechan_transport::Channel;
use tracing::trace;

use crate::codec::{encode_frame, Message, HEADER_SIZE};
use crate::command::{Command, Status};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = HEADER_SIZE + 1024;

/// Writes complete messages to a [`Channel`].
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    /// Create a new message writer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and send one message.
    ///
    /// The message is fully encoded before anything is written, so a
    /// rejected payload never puts a partial frame on the wire.
    pub fn send<T: AsFd + Write>(
        &mut self,
        channel: &mut Channel<T>,
        command: Command,
        status: Status,
        payload: &[u8],
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.buf.clear();
        encode_frame(command.as_u8(), status, payload, &mut self.buf)?;
        channel.write_all(&self.buf, timeout)?;
        trace!(%command, %status, len = payload.len(), "message sent");
        Ok(())
    }

    /// Send a request carrying the `None` status placeholder.
    pub fn send_request<T: AsFd + Write>(
        &mut self,
        channel: &mut Channel<T>,
        command: Command,
        payload: &[u8],
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.send(channel, command, Status::None, payload, timeout)
    }

    /// Send a complete [`Message`].
    pub fn write_message<T: AsFd + Write>(
        &mut self,
        channel: &mut Channel<T>,
        message: &Message,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.send(
            channel,
            message.command,
            message.status,
            &message.payload,
            timeout,
        )
    }
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::new()
    }
}
