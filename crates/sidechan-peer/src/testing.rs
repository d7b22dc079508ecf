//! Scripted backends for unit tests.

use std::os::unix::net::UnixStream;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::BytesMut;
use sidechan_frame::{encode_frame, Command, Message, MessageReader, Status, MAX_PAYLOAD};
use sidechan_transport::Channel;

use crate::side_channel::SideChannel;

const SCRIPT_TIMEOUT: Option<Duration> = Some(Duration::from_secs(5));

/// Encode a response frame.
pub(crate) fn frame(command: Command, status: Status, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_frame(command.as_u8(), status, payload, &mut buf).unwrap();
    buf.to_vec()
}

/// An `oid\0value` payload.
pub(crate) fn oid_value(oid: &str, value: &[u8]) -> Vec<u8> {
    let mut payload = oid.as_bytes().to_vec();
    payload.push(0);
    payload.extend_from_slice(value);
    payload
}

/// Spawn a backend that answers each incoming request with the next raw
/// reply, then hangs up. Joining yields the requests it received.
pub(crate) fn scripted_backend(
    replies: Vec<Vec<u8>>,
) -> (SideChannel<UnixStream>, JoinHandle<Vec<Message>>) {
    let (client, backend) = UnixStream::pair().unwrap();
    let handle = thread::spawn(move || {
        let mut channel = Channel::new(backend);
        let mut reader = MessageReader::new();
        let mut seen = Vec::new();
        for reply in replies {
            let request = reader
                .read_message(&mut channel, MAX_PAYLOAD, SCRIPT_TIMEOUT)
                .unwrap();
            seen.push(request);
            channel.write_all(&reply, SCRIPT_TIMEOUT).unwrap();
        }
        seen
    });
    (SideChannel::new(client), handle)
}
