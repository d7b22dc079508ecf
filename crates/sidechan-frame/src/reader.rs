use std::io::Read;
use std::os::fd::AsFd;
use std::time::Duration;

use sidechan_transport::Channel;

use crate::codec::{decode_frame, decode_message, Decoded, Message, MAX_FRAME};
use crate::error::Result;

/// Reads one message per call from a [`Channel`].
///
/// Owns a receive buffer sized for the largest possible frame so a valid
/// message is never truncated by the read itself.
pub struct MessageReader {
    buf: Box<[u8]>,
}

impl MessageReader {
    /// Create a reader with a `MAX_FRAME` receive buffer.
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; MAX_FRAME].into_boxed_slice(),
        }
    }

    /// Read one message and copy its payload into `dest`.
    ///
    /// Performs a single channel read; see [`decode_frame`] for the bounds
    /// rules applied to what arrives.
    pub fn read_into<T: AsFd + Read>(
        &mut self,
        channel: &mut Channel<T>,
        dest: Option<&mut [u8]>,
        timeout: Option<Duration>,
    ) -> Result<Decoded> {
        let n = channel.read_some(&mut self.buf, timeout)?;
        decode_frame(&self.buf[..n], dest)
    }

    /// Read one message into an owned [`Message`] of at most `max_payload`
    /// payload bytes.
    pub fn read_message<T: AsFd + Read>(
        &mut self,
        channel: &mut Channel<T>,
        max_payload: usize,
        timeout: Option<Duration>,
    ) -> Result<Message> {
        let raw = self.read_raw(channel, timeout)?;
        decode_message(raw, max_payload)
    }

    /// Read whatever one channel read returns, undecoded.
    ///
    /// Lets a responder inspect the command byte of a message that fails
    /// to decode.
    pub fn read_raw<T: AsFd + Read>(
        &mut self,
        channel: &mut Channel<T>,
        timeout: Option<Duration>,
    ) -> Result<&[u8]> {
        let n = channel.read_some(&mut self.buf, timeout)?;
        Ok(&self.buf[..n])
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    use super::*;
    use crate::codec::MAX_PAYLOAD;
    use crate::command::{Command, Status};
    use crate::error::FrameError;

    const TIMEOUT: Option<Duration> = Some(Duration::from_secs(1));

    #[test]
    fn read_single_message() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&[4, 1, 0, 5, b'M', b'F', b'G', b':', b'X']).unwrap();

        let mut channel = Channel::new(right);
        let mut reader = MessageReader::new();
        let mut dest = [0u8; 32];
        let decoded = reader
            .read_into(&mut channel, Some(&mut dest), TIMEOUT)
            .unwrap();

        assert_eq!(decoded.command, Command::GetDeviceId);
        assert_eq!(decoded.status, Status::Ok);
        assert_eq!(&dest[..decoded.len], b"MFG:X");
    }

    #[test]
    fn read_owned_message() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&[7, 4, 0, 0]).unwrap();

        let mut channel = Channel::new(right);
        let message = MessageReader::new()
            .read_message(&mut channel, MAX_PAYLOAD, TIMEOUT)
            .unwrap();
        assert_eq!(message.command, Command::SnmpGetNext);
        assert_eq!(message.status, Status::NoResponse);
        assert!(message.payload.is_empty());
    }

    #[test]
    fn connection_closed_is_truncated() {
        let (left, right) = UnixStream::pair().unwrap();
        drop(left);

        let mut channel = Channel::new(right);
        let err = MessageReader::new()
            .read_into(&mut channel, None, TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, FrameError::Truncated { received: 0 }));
        assert_eq!(err.status(), Status::BadMessage);
    }

    #[test]
    fn silent_peer_times_out() {
        let (_left, right) = UnixStream::pair().unwrap();
        let mut channel = Channel::new(right);
        let err = MessageReader::new()
            .read_into(&mut channel, None, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(err.status(), Status::Timeout);
    }

    #[test]
    fn hostile_length_is_rejected_not_truncated() {
        let (mut left, right) = UnixStream::pair().unwrap();
        left.write_all(&[6, 1, 0xFF, 0xFF, b'1', b'.', b'3']).unwrap();

        let mut channel = Channel::new(right);
        let mut dest = vec![0u8; MAX_PAYLOAD];
        let err = MessageReader::new()
            .read_into(&mut channel, Some(&mut dest), TIMEOUT)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::LengthExceedsReceived {
                declared: 65535,
                received: 3
            }
        ));
    }
}
