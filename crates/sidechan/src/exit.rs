use std::fmt;
use std::io;

use sidechan_frame::Status;
use sidechan_peer::{MibError, SideChannelError};
use sidechan_transport::TransportError;

// Exit codes follow sysexits where one fits, and timeout(1) for timeouts.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const UNAVAILABLE: i32 = 69;
pub const IO_ERROR: i32 = 74;
pub const TIMEOUT: i32 = 124;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => USAGE,
        _ => IO_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Closed => CliError::new(IO_ERROR, format!("{context}: {err}")),
    }
}

/// Map a failed request onto the exit code for its protocol status.
pub fn status_code(status: Status) -> i32 {
    match status {
        Status::Timeout => TIMEOUT,
        Status::BadMessage | Status::TooBig => DATA_INVALID,
        Status::NoResponse | Status::NotImplemented => UNAVAILABLE,
        Status::IoError => IO_ERROR,
        Status::None | Status::Ok => FAILURE,
    }
}

pub fn side_channel_error(context: &str, err: SideChannelError) -> CliError {
    CliError::new(status_code(err.status()), format!("{context}: {err}"))
}

pub fn mib_error(context: &str, err: MibError) -> CliError {
    match err {
        MibError::Read { source, path } => {
            io_error(&format!("{context}: {}", path.display()), source)
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
