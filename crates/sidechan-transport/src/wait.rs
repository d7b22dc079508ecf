//! Readiness waiting on a single descriptor.
//!
//! All blocking in sidechan happens here. The wait is built on `poll(2)`,
//! which gives millisecond resolution and has no descriptor-number ceiling.

use std::io::{self, ErrorKind};
use std::os::fd::{AsFd, AsRawFd};
use std::time::Duration;

use tracing::trace;

/// Direction to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Readable,
    Writable,
}

impl Interest {
    fn poll_events(self) -> libc::c_short {
        match self {
            Interest::Readable => libc::POLLIN,
            Interest::Writable => libc::POLLOUT,
        }
    }
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The descriptor is ready (or has a pending error/hangup that the next
    /// read or write will report).
    Ready,
    /// The timeout elapsed first.
    TimedOut,
}

/// Returns true for failures that must be retried instead of reported.
pub fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

/// Run `op` until it returns something other than a transient failure.
///
/// Every retry reissues the operation with its original arguments, so a wait
/// interrupted by a signal starts over with the full timeout.
pub fn retry_transient<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(err) if is_transient(&err) => {
                trace!(kind = ?err.kind(), "retrying after transient failure");
            }
            other => return other,
        }
    }
}

/// Wait until `fd` is ready for `interest`.
///
/// `None` blocks indefinitely, `Some(Duration::ZERO)` polls without blocking,
/// anything else bounds the wait. Sub-millisecond remainders round up so a
/// short positive timeout never degrades into a poll.
pub fn wait_ready<F: AsFd + ?Sized>(
    fd: &F,
    interest: Interest,
    timeout: Option<Duration>,
) -> io::Result<Readiness> {
    let raw = fd.as_fd().as_raw_fd();
    let timeout_ms = poll_timeout_ms(timeout);

    let revents = retry_transient(|| {
        let mut pfd = libc::pollfd {
            fd: raw,
            events: interest.poll_events(),
            revents: 0,
        };
        // SAFETY: `pfd` is a valid, writable pollfd and we pass a count of 1.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else if rc == 0 {
            Ok(None)
        } else {
            Ok(Some(pfd.revents))
        }
    })?;

    match revents {
        None => {
            trace!(fd = raw, ?interest, ?timeout, "wait timed out");
            Ok(Readiness::TimedOut)
        }
        Some(revents) if revents & libc::POLLNVAL != 0 => {
            Err(io::Error::from_raw_os_error(libc::EBADF))
        }
        Some(_) => Ok(Readiness::Ready),
    }
}

fn poll_timeout_ms(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(timeout) => {
            let mut ms = timeout.as_millis();
            if timeout.subsec_nanos() % 1_000_000 != 0 {
                ms += 1;
            }
            ms.min(libc::c_int::MAX as u128) as libc::c_int
        }
    }
}
