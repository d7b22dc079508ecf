use std::time::Duration;

/// Errors that can occur in channel I/O.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The descriptor did not become ready before the timeout elapsed.
    #[error("timed out waiting for channel (timeout {0:?})")]
    Timeout(Option<Duration>),

    /// A non-transient I/O error occurred on the descriptor.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer stopped accepting bytes (zero-length write).
    #[error("channel closed by peer")]
    Closed,
}

impl TransportError {
    /// Returns true for the timeout outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
