use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, BorrowedFd, RawFd};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Result, TransportError};
use crate::wait::{is_transient, retry_transient, wait_ready, Interest, Readiness};

/// A caller-owned stream descriptor with timeout-bounded I/O.
///
/// `Channel` never opens or discovers endpoints. Wrap whatever the
/// surrounding process hands over: a socket pair end, a pipe end, or an
/// inherited descriptor via [`Channel::from_inherited`].
pub struct Channel<T> {
    inner: T,
}

impl<T> Channel<T> {
    /// Wrap an already-open stream.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the channel and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl Channel<File> {
    /// Duplicate an inherited descriptor number into an owned channel.
    ///
    /// The original descriptor stays open and untouched; dropping the channel
    /// only closes the duplicate.
    pub fn from_inherited(fd: RawFd) -> Result<Self> {
        // SAFETY: F_GETFD only inspects descriptor flags.
        if unsafe { libc::fcntl(fd, libc::F_GETFD) } < 0 {
            return Err(TransportError::Io(std::io::Error::last_os_error()));
        }
        // SAFETY: fcntl just confirmed `fd` is open, and the borrow does not
        // outlive this call; only the owned duplicate escapes.
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        let owned = borrowed.try_clone_to_owned()?;
        debug!(fd, "wrapped inherited descriptor");
        Ok(Self::new(File::from(owned)))
    }
}

impl<T: AsFd + Read> Channel<T> {
    /// Wait until readable, then perform exactly one read into `buf`.
    ///
    /// Returns the number of bytes read; `0` means the peer closed its end.
    /// The buffer is not filled in a loop.
    pub fn read_some(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize> {
        if wait_ready(&self.inner, Interest::Readable, timeout)? == Readiness::TimedOut {
            return Err(TransportError::Timeout(timeout));
        }

        let inner = &mut self.inner;
        let read = retry_transient(|| inner.read(buf))?;
        trace!(bytes = read, "channel read");
        Ok(read)
    }
}

impl<T: AsFd + Write> Channel<T> {
    /// Write every byte of `bytes`, waiting for writability before each
    /// attempt.
    ///
    /// Partial writes continue from where the previous one stopped.
    /// Interrupted or would-block writes re-wait; every wait is bounded by
    /// the full `timeout`. Any other write failure aborts immediately.
    pub fn write_all(&mut self, bytes: &[u8], timeout: Option<Duration>) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            if wait_ready(&self.inner, Interest::Writable, timeout)? == Readiness::TimedOut {
                debug!(sent = offset, total = bytes.len(), "write timed out");
                return Err(TransportError::Timeout(timeout));
            }

            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if is_transient(&err) => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        let inner = &mut self.inner;
        retry_transient(|| inner.flush())?;
        trace!(bytes = bytes.len(), "channel write");
        Ok(())
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}
