//! Push events sent to the client

use serde::Serialize;

/// One server-push event. Serialises to the bare JSON object the client
/// reads, e.g. `{"heartbeat":true}` or `{"heading":"Writing procedure steps"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PushEvent {
    Heartbeat {
        heartbeat: bool,
    },
    Heading {
        heading: String,
    },
    Done {
        done: bool,
        response: String,
        #[serde(rename = "docPath")]
        doc_path: Option<String>,
    },
    Error {
        error: String,
    },
}

impl PushEvent {
    pub fn heartbeat() -> Self {
        Self::Heartbeat { heartbeat: true }
    }

    pub fn heading(label: impl Into<String>) -> Self {
        Self::Heading {
            heading: label.into(),
        }
    }

    pub fn done(response: impl Into<String>, doc_path: Option<String>) -> Self {
        Self::Done {
            done: true,
            response: response.into(),
            doc_path,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Whether this event ends the request
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
