//! Request-scoped cancellation
//!
//! One token per request. The upstream reader and the heartbeat each run on
//! a child token, so tearing down the request stops both.

use tokio_util::sync::{CancellationToken, DropGuard};

/// Wrapper around CancellationToken for one streamed request
#[derive(Clone, Debug)]
pub struct RequestCancellation {
    token: CancellationToken,
}

impl RequestCancellation {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Cancel every task tied to this request
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Get a child token for a subtask
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Guard that cancels the request when dropped; held by the transport
    /// for as long as the client is connected
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

impl Default for RequestCancellation {
    fn default() -> Self {
        Self::new()
    }
}
