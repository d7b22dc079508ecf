use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::time::Duration;

use sidechan_frame::{
    decode_message, Command, Message, MessageReader, MessageWriter, Status, MAX_PAYLOAD,
};
use sidechan_transport::Channel;
use tracing::{debug, warn};

use crate::config::SideChannelConfig;
use crate::error::{Result, SideChannelError};
use crate::responder::{Reply, Request, RequestHandler};

/// One end of a side channel.
///
/// The same type serves both roles: a filter issues requests with
/// [`do_request`](Self::do_request) and the higher-level helpers, while the
/// backend answers with [`read_request`](Self::read_request) and
/// [`respond`](Self::respond), or [`serve`](Self::serve).
pub struct SideChannel<T> {
    channel: Channel<T>,
    reader: MessageReader,
    writer: MessageWriter,
    config: SideChannelConfig,
}

impl<T> SideChannel<T> {
    /// Wrap an already-open bidirectional stream with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, SideChannelConfig::default())
    }

    /// Wrap an already-open bidirectional stream with explicit configuration.
    pub fn with_config(inner: T, config: SideChannelConfig) -> Self {
        Self::from_channel(Channel::new(inner), config)
    }

    /// Build on an existing [`Channel`].
    pub fn from_channel(channel: Channel<T>, config: SideChannelConfig) -> Self {
        Self {
            channel,
            reader: MessageReader::new(),
            writer: MessageWriter::new(),
            config,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SideChannelConfig {
        &self.config
    }

    /// Change the per-request timeout for subsequent requests.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.config.timeout = timeout;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        self.channel.get_ref()
    }

    /// Consume the side channel and return the inner stream.
    pub fn into_inner(self) -> T {
        self.channel.into_inner()
    }
}

impl<T: AsFd + Read + Write> SideChannel<T> {
    /// Send one request and wait for its response.
    ///
    /// Failing to write the request, or to read and decode a response, is
    /// reported as [`SideChannelError::Timeout`]; the only decode failure
    /// that surfaces on its own is an oversized response. A response for a
    /// different command, or one still carrying the request placeholder
    /// status, means the channel is out of step and yields `BadMessage`.
    ///
    /// A status byte outside the known table makes the response undecodable,
    /// so it is reported as `Timeout` rather than passed through.
    ///
    /// The returned message may carry any final status; interpreting it is
    /// up to the caller.
    pub fn do_request(&mut self, command: Command, payload: &[u8]) -> Result<Message> {
        let timeout = self.config.timeout;

        if let Err(err) = self
            .writer
            .send_request(&mut self.channel, command, payload, timeout)
        {
            debug!(%command, error = %err, "request not sent");
            return Err(SideChannelError::Timeout);
        }

        let response =
            match self
                .reader
                .read_message(&mut self.channel, self.config.max_response, timeout)
            {
                Ok(response) => response,
                Err(err) if err.status() == Status::TooBig => return Err(err.into()),
                Err(err) => {
                    debug!(%command, error = %err, "no usable response");
                    return Err(SideChannelError::Timeout);
                }
            };

        if response.command != command {
            debug!(sent = %command, received = %response.command, "response command mismatch");
            return Err(SideChannelError::bad_message(format!(
                "response to {command} arrived as {}",
                response.command
            )));
        }
        if response.status == Status::None {
            return Err(SideChannelError::bad_message(format!(
                "response to {command} carries no status"
            )));
        }

        debug!(%command, status = %response.status, len = response.payload.len(), "request complete");
        Ok(response)
    }

    /// Like [`do_request`](Self::do_request), but copies the response
    /// payload into `dest` and returns the status and payload length.
    pub fn do_request_into(
        &mut self,
        command: Command,
        payload: &[u8],
        dest: &mut [u8],
    ) -> Result<(Status, usize)> {
        let response = self.do_request(command, payload)?;
        let len = response.payload.len();
        if len > dest.len() {
            return Err(SideChannelError::TooBig {
                size: len,
                max: dest.len(),
            });
        }
        dest[..len].copy_from_slice(&response.payload);
        Ok((response.status, len))
    }

    /// Backend side: read one request.
    ///
    /// The status byte of a request is a placeholder and is not checked.
    pub fn read_request(&mut self) -> Result<Request> {
        let message = self
            .reader
            .read_message(&mut self.channel, MAX_PAYLOAD, self.config.timeout)?;
        Ok(Request {
            command: message.command,
            payload: message.payload,
        })
    }

    /// Backend side: send the response to a request.
    pub fn respond(&mut self, command: Command, status: Status, payload: &[u8]) -> Result<()> {
        if status == Status::None {
            return Err(SideChannelError::bad_message(
                "responses must carry a final status",
            ));
        }
        self.writer
            .send(&mut self.channel, command, status, payload, self.config.timeout)?;
        Ok(())
    }

    /// Backend side: answer requests with `handler` until the peer closes
    /// the channel. Returns the number of requests answered.
    ///
    /// Waiting for the next request never times out. A request that fails
    /// to decode but names a valid command is answered with the matching
    /// error status; anything else is logged and skipped.
    pub fn serve<H: RequestHandler + ?Sized>(&mut self, handler: &mut H) -> Result<usize> {
        let mut answered = 0usize;
        loop {
            let raw = self.reader.read_raw(&mut self.channel, None)?;
            if raw.is_empty() {
                debug!(answered, "peer closed side channel");
                return Ok(answered);
            }

            let reply = match decode_message(raw, MAX_PAYLOAD) {
                Ok(message) => {
                    let request = Request {
                        command: message.command,
                        payload: message.payload,
                    };
                    let reply = handler.handle(&request);
                    (request.command, reply)
                }
                Err(err) => match Command::from_u8(raw[0]) {
                    Some(command) => {
                        warn!(%command, error = %err, "answering undecodable request");
                        (command, Reply::status(err.status()))
                    }
                    _ => {
                        warn!(error = %err, "skipping undecodable request");
                        continue;
                    }
                },
            };

            let (command, reply) = reply;
            self.respond(command, reply.status, &reply.payload)?;
            answered += 1;
        }
    }
}

impl<T> std::fmt::Debug for SideChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixStream;
    use std::thread;

    use bytes::Bytes;

    use super::*;
    use crate::testing::{frame, scripted_backend};

    #[test]
    fn request_roundtrip() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetDeviceId, Status::Ok, b"MFG:ACME;")]);

        let response = side.do_request(Command::GetDeviceId, b"").unwrap();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.payload.as_ref(), b"MFG:ACME;");

        let seen = backend.join().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].command, Command::GetDeviceId);
        assert_eq!(seen[0].status, Status::None);
    }

    #[test]
    fn peer_status_passes_through() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetBidi, Status::NotImplemented, b"")]);
        let response = side.do_request(Command::GetBidi, b"").unwrap();
        assert_eq!(response.status, Status::NotImplemented);
        backend.join().unwrap();
    }

    #[test]
    fn mismatched_command_is_bad_message() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetState, Status::Ok, b"\x00")]);
        let err = side.do_request(Command::GetBidi, b"").unwrap_err();
        assert!(matches!(err, SideChannelError::BadMessage(_)));
        assert_eq!(err.status(), Status::BadMessage);
        backend.join().unwrap();
    }

    #[test]
    fn placeholder_status_in_response_is_bad_message() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetState, Status::None, b"\x00")]);
        let err = side.do_request(Command::GetState, b"").unwrap_err();
        assert_eq!(err.status(), Status::BadMessage);
        backend.join().unwrap();
    }

    #[test]
    fn garbage_response_is_timeout() {
        let (mut side, backend) = scripted_backend(vec![vec![0xEE, 1, 0, 0]]);
        let err = side.do_request(Command::GetState, b"").unwrap_err();
        assert!(matches!(err, SideChannelError::Timeout));
        backend.join().unwrap();
    }

    #[test]
    fn unknown_status_byte_is_timeout() {
        let (mut side, backend) =
            scripted_backend(vec![vec![Command::GetState.as_u8(), 0x42, 0, 0]]);
        let err = side.do_request(Command::GetState, b"").unwrap_err();
        assert!(matches!(err, SideChannelError::Timeout));
        backend.join().unwrap();
    }

    #[test]
    fn silent_backend_is_timeout() {
        let (client, _backend) = UnixStream::pair().unwrap();
        let mut side = SideChannel::with_config(
            client,
            SideChannelConfig {
                timeout: Some(Duration::from_millis(20)),
                ..SideChannelConfig::default()
            },
        );
        let err = side.do_request(Command::DrainOutput, b"").unwrap_err();
        assert!(matches!(err, SideChannelError::Timeout));
        assert_eq!(err.status(), Status::Timeout);
    }

    #[test]
    fn set_timeout_applies_to_next_request() {
        let (client, _backend) = UnixStream::pair().unwrap();
        let mut side = SideChannel::new(client);
        assert_eq!(side.config().timeout, Some(crate::DEFAULT_TIMEOUT));

        side.set_timeout(Some(Duration::ZERO));
        assert_eq!(side.config().timeout, Some(Duration::ZERO));

        let start = std::time::Instant::now();
        let err = side.do_request(Command::GetState, b"").unwrap_err();
        assert!(matches!(err, SideChannelError::Timeout));
        assert!(start.elapsed() < crate::DEFAULT_TIMEOUT);
    }

    #[test]
    fn oversized_request_is_timeout() {
        let (client, _backend) = UnixStream::pair().unwrap();
        let mut side = SideChannel::new(client);
        let payload = vec![b'1'; MAX_PAYLOAD + 1];
        let err = side.do_request(Command::SnmpGet, &payload).unwrap_err();
        assert!(matches!(err, SideChannelError::Timeout));
    }

    #[test]
    fn response_beyond_configured_limit_is_too_big() {
        let (client, backend) = UnixStream::pair().unwrap();
        let backend = thread::spawn(move || {
            let mut channel = Channel::new(backend);
            let mut reader = MessageReader::new();
            reader
                .read_message(&mut channel, MAX_PAYLOAD, Some(Duration::from_secs(5)))
                .unwrap();
            channel
                .write_all(
                    &frame(Command::GetDeviceId, Status::Ok, &[b'x'; 64]),
                    Some(Duration::from_secs(5)),
                )
                .unwrap();
        });

        let mut side = SideChannel::with_config(
            client,
            SideChannelConfig {
                max_response: 16,
                ..SideChannelConfig::default()
            },
        );
        let err = side.do_request(Command::GetDeviceId, b"").unwrap_err();
        assert_eq!(err.status(), Status::TooBig);
        backend.join().unwrap();
    }

    #[test]
    fn do_request_into_copies_payload() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetDeviceId, Status::Ok, b"CMD:PCL;")]);
        let mut dest = [0u8; 16];
        let (status, len) = side
            .do_request_into(Command::GetDeviceId, b"", &mut dest)
            .unwrap();
        assert_eq!(status, Status::Ok);
        assert_eq!(&dest[..len], b"CMD:PCL;");
        backend.join().unwrap();
    }

    #[test]
    fn do_request_into_rejects_small_destination() {
        let (mut side, backend) =
            scripted_backend(vec![frame(Command::GetDeviceId, Status::Ok, b"CMD:PCL;")]);
        let mut dest = [0u8; 4];
        let err = side
            .do_request_into(Command::GetDeviceId, b"", &mut dest)
            .unwrap_err();
        assert!(matches!(err, SideChannelError::TooBig { size: 8, max: 4 }));
        backend.join().unwrap();
    }

    #[test]
    fn respond_rejects_placeholder_status() {
        let (backend, _client) = UnixStream::pair().unwrap();
        let mut side = SideChannel::new(backend);
        let err = side
            .respond(Command::GetState, Status::None, b"")
            .unwrap_err();
        assert_eq!(err.status(), Status::BadMessage);
    }

    #[test]
    fn backend_reads_request_and_responds() {
        let (client, backend) = UnixStream::pair().unwrap();
        let server = thread::spawn(move || {
            let mut side = SideChannel::new(backend);
            let request = side.read_request().unwrap();
            assert_eq!(request.command, Command::GetConnected);
            side.respond(request.command, Status::Ok, b"\x01").unwrap();
        });

        let mut side = SideChannel::new(client);
        let response = side.do_request(Command::GetConnected, b"").unwrap();
        assert_eq!(response.payload, Bytes::from_static(b"\x01"));
        server.join().unwrap();
    }

    struct Counting {
        calls: usize,
    }

    impl RequestHandler for Counting {
        fn handle(&mut self, request: &Request) -> Reply {
            self.calls += 1;
            match request.command {
                Command::GetState => Reply::ok(Bytes::from_static(b"\x02")),
                _ => Reply::status(Status::NotImplemented),
            }
        }
    }

    #[test]
    fn serve_answers_until_peer_closes() {
        let (client, backend) = UnixStream::pair().unwrap();
        let server = thread::spawn(move || {
            let mut side = SideChannel::new(backend);
            let mut handler = Counting { calls: 0 };
            let answered = side.serve(&mut handler).unwrap();
            (answered, handler.calls)
        });

        let mut side = SideChannel::new(client);
        let state = side.do_request(Command::GetState, b"").unwrap();
        assert_eq!(state.payload.as_ref(), b"\x02");
        let reset = side.do_request(Command::SoftReset, b"").unwrap();
        assert_eq!(reset.status, Status::NotImplemented);
        drop(side);

        assert_eq!(server.join().unwrap(), (2, 2));
    }

    #[test]
    fn serve_answers_undecodable_request_with_error_status() {
        let (client, backend) = UnixStream::pair().unwrap();
        let server = thread::spawn(move || {
            let mut side = SideChannel::new(backend);
            side.serve(&mut Counting { calls: 0 }).unwrap()
        });

        // Declares 200 payload bytes but carries 3.
        let mut channel = Channel::new(client);
        channel
            .write_all(&[6, 0, 0, 200, b'1', b'.', b'3'], Some(Duration::from_secs(1)))
            .unwrap();
        let reply = MessageReader::new()
            .read_message(&mut channel, MAX_PAYLOAD, Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(reply.command, Command::SnmpGet);
        assert_eq!(reply.status, Status::TooBig);
        drop(channel);

        assert_eq!(server.join().unwrap(), 1);
    }
}
