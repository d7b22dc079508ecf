use bytes::Bytes;
use sidechan_frame::{Command, Status};

/// A request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub payload: Bytes,
}

/// What the backend sends back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub payload: Bytes,
}

impl Reply {
    /// A successful reply carrying `payload`.
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// A reply with `status` and no payload.
    pub fn status(status: Status) -> Self {
        Self {
            status,
            payload: Bytes::new(),
        }
    }
}

/// Backend logic behind [`SideChannel::serve`](crate::SideChannel::serve).
pub trait RequestHandler {
    /// Produce the reply for one request. The reply is sent with the
    /// request's command.
    fn handle(&mut self, request: &Request) -> Reply;
}

impl<F> RequestHandler for F
where
    F: FnMut(&Request) -> Reply,
{
    fn handle(&mut self, request: &Request) -> Reply {
        self(request)
    }
}
