use sidechan_transport::TransportError;

use crate::command::Status;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than a complete header were received.
    #[error("truncated message ({received} bytes, header needs 4)")]
    Truncated { received: usize },

    /// The command byte is outside the valid range.
    #[error("invalid command code {0}")]
    InvalidCommand(u8),

    /// The status byte is not a known status code.
    #[error("invalid status code {0}")]
    InvalidStatus(u8),

    /// The payload exceeds the destination capacity or the protocol maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The header declares more payload than was actually received.
    #[error("declared length {declared} exceeds received payload ({received} bytes)")]
    LengthExceedsReceived { declared: usize, received: usize },

    /// The header declares a payload but no destination buffer was supplied.
    #[error("message carries {declared} payload bytes but no buffer was supplied")]
    MissingBuffer { declared: usize },

    /// The underlying channel failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// Fold this error into the protocol status taxonomy.
    pub fn status(&self) -> Status {
        match self {
            FrameError::Truncated { .. }
            | FrameError::InvalidCommand(_)
            | FrameError::InvalidStatus(_) => Status::BadMessage,
            FrameError::PayloadTooLarge { .. }
            | FrameError::LengthExceedsReceived { .. }
            | FrameError::MissingBuffer { .. } => Status::TooBig,
            FrameError::Transport(TransportError::Timeout(_)) => Status::Timeout,
            FrameError::Transport(_) => Status::IoError,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
