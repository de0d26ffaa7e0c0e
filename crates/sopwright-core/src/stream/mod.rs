//! Server-push streaming of one synthesis request

mod cancellation;
mod events;
mod heartbeat;
mod orchestrator;
mod sink;

pub use cancellation::RequestCancellation;
pub use events::PushEvent;
pub use heartbeat::{Heartbeat, HEARTBEAT_PERIOD};
pub use orchestrator::{Orchestrator, StoredDocument, StreamState};
pub use sink::PushSink;
