//! Push channel shared between the orchestrator and its heartbeat task

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use super::events::PushEvent;

/// Sending half of a request's push channel.
///
/// Cloned into the heartbeat task. Once a terminal event has gone out the
/// sender is dropped, which closes the channel; anything sent afterwards is
/// discarded silently.
#[derive(Debug, Clone)]
pub struct PushSink {
    tx: Arc<Mutex<Option<mpsc::Sender<PushEvent>>>>,
}

impl PushSink {
    /// New sink and the receiver the transport drains
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Deliver a non-terminal event. Returns false when it was dropped,
    /// either because the request already finished or the receiver is gone.
    pub async fn send(&self, event: PushEvent) -> bool {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => {
                trace!(?event, "Discarding event after close");
                false
            }
        }
    }

    /// Deliver the terminal event and close the channel. Returns false if
    /// the sink was already closed or the receiver is gone.
    pub async fn finish(&self, event: PushEvent) -> bool {
        let mut guard = self.tx.lock().await;
        match guard.take() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Close without a terminal event (client went away)
    pub async fn close(&self) {
        self.tx.lock().await.take();
    }
}
