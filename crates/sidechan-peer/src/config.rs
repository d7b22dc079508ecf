use std::time::Duration;

use sidechan_frame::MAX_PAYLOAD;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`SideChannel`](crate::SideChannel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideChannelConfig {
    /// Timeout applied to each wait of each request. `None` blocks
    /// indefinitely; `Some(Duration::ZERO)` never blocks.
    ///
    /// A walk applies it per round, so its total duration grows with the
    /// number of values returned.
    pub timeout: Option<Duration>,
    /// Largest response payload accepted. Default: 65535.
    pub max_response: usize,
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_response: MAX_PAYLOAD,
        }
    }
}
