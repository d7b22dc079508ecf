use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::time::Duration;

use tracing::trace;

use crate::channel::Channel;
use crate::error::Result;

/// The unframed status stream between a driver and its filter.
///
/// Bytes are application-defined and pass through untouched. Reads are a
/// single attempt; writes send everything or fail.
#[derive(Debug)]
pub struct BackChannel<T> {
    channel: Channel<T>,
}

impl<T> BackChannel<T> {
    /// Wrap an already-open back channel stream.
    pub fn new(inner: T) -> Self {
        Self {
            channel: Channel::new(inner),
        }
    }

    /// Consume the back channel and return the inner stream.
    pub fn into_inner(self) -> T {
        self.channel.into_inner()
    }
}

impl<T> From<Channel<T>> for BackChannel<T> {
    fn from(channel: Channel<T>) -> Self {
        Self { channel }
    }
}

impl<T: AsFd + Read> BackChannel<T> {
    /// Read whatever is available, up to `buf.len()` bytes.
    ///
    /// `Some(Duration::ZERO)` returns immediately when nothing is pending.
    pub fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize> {
        let n = self.channel.read_some(buf, timeout)?;
        trace!(bytes = n, "back channel read");
        Ok(n)
    }
}

impl<T: AsFd + Write> BackChannel<T> {
    /// Write all of `bytes`, returning the count written.
    pub fn write(&mut self, bytes: &[u8], timeout: Option<Duration>) -> Result<usize> {
        self.channel.write_all(bytes, timeout)?;
        trace!(bytes = bytes.len(), "back channel write");
        Ok(bytes.len())
    }
}
