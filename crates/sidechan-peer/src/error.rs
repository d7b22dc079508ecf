use sidechan_frame::{FrameError, Status};
use sidechan_transport::TransportError;

/// Errors that can occur in side-channel operations.
#[derive(Debug, thiserror::Error)]
pub enum SideChannelError {
    /// No response arrived in time, or the request could not be written
    /// or read back.
    #[error("side-channel request timed out")]
    Timeout,

    /// The exchange was structurally invalid.
    #[error("bad message: {0}")]
    BadMessage(String),

    /// A value does not fit the destination buffer.
    #[error("value too big ({size} bytes, capacity {max})")]
    TooBig { size: usize, max: usize },

    /// The backend answered with a non-ok status.
    #[error("backend reported {0}")]
    Status(Status),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SideChannelError {
    pub(crate) fn bad_message(reason: impl Into<String>) -> Self {
        SideChannelError::BadMessage(reason.into())
    }

    /// Fold this error into the protocol status taxonomy.
    pub fn status(&self) -> Status {
        match self {
            SideChannelError::Timeout => Status::Timeout,
            SideChannelError::BadMessage(_) => Status::BadMessage,
            SideChannelError::TooBig { .. } => Status::TooBig,
            SideChannelError::Status(status) => *status,
            SideChannelError::Frame(err) => err.status(),
            SideChannelError::Transport(TransportError::Timeout(_)) => Status::Timeout,
            SideChannelError::Transport(_) => Status::IoError,
        }
    }
}

pub type Result<T> = std::result::Result<T, SideChannelError>;

/// Errors loading an emulator MIB table.
#[derive(Debug, thiserror::Error)]
pub enum MibError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("invalid MIB JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid OID '{0}'")]
    InvalidOid(String),
}
