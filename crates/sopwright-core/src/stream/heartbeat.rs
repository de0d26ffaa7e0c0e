//! Periodic keep-alive events

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::events::PushEvent;
use super::sink::PushSink;

/// Default period between heartbeats
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(5);

/// Armed heartbeat timer. Stops when disarmed, when dropped, when the parent
/// token is cancelled, or when the sink stops accepting events.
pub struct Heartbeat {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Heartbeat {
    /// Start sending heartbeats every `period`, the first one `period` from now
    pub fn arm(sink: PushSink, period: Duration, parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !sink.send(PushEvent::heartbeat()).await {
                            break;
                        }
                        trace!("Heartbeat sent");
                    }
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Stop the timer and wait for its task to exit
    pub async fn disarm(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
