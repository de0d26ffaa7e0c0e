//! Stream orchestration
//!
//! Drives one request from the first upstream fragment to its terminal push
//! event: heartbeats and heading progress while streaming, then the
//! structural gate, then render and store.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::events::PushEvent;
use super::heartbeat::{Heartbeat, HEARTBEAT_PERIOD};
use super::sink::PushSink;
use crate::document::parse;
use crate::error::{Result, SopError};
use crate::render::{render, FrontMatter};
use crate::store::{random_id, ArtifactStore};
use crate::synthesis::{extract_title, slug, HeadingDetector, HeadingSpec, StructuralValidator};

/// Lifecycle of one streamed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Validating,
    Rendering,
    Error,
    Done,
}

/// A rendered document that has been written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub title: String,
    pub filename: String,
}

impl StoredDocument {
    /// Status line shown to the user once the artifact exists
    pub fn status(&self) -> String {
        format!("✅ SOP \"{}\" created Successfully", self.title)
    }
}

/// Per-request state, logged on every transition
struct Tracker {
    request_id: String,
    state: StreamState,
}

impl Tracker {
    fn new() -> Self {
        let mut request_id = random_id();
        request_id.truncate(8);
        Self {
            request_id,
            state: StreamState::Idle,
        }
    }

    fn enter(&mut self, next: StreamState) {
        debug!(
            request_id = %self.request_id,
            from = ?self.state,
            to = ?next,
            "Stream state transition"
        );
        self.state = next;
    }
}

/// Glues detection, validation, rendering and storage to a push channel
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: ArtifactStore,
    detector: HeadingDetector,
    validator: StructuralValidator,
    heartbeat_period: Duration,
}

impl Orchestrator {
    /// Orchestrator with the standard section table and required headings
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            detector: HeadingDetector::standard(),
            validator: StructuralValidator::standard(),
            heartbeat_period: HEARTBEAT_PERIOD,
        }
    }

    pub fn with_sections(mut self, sections: &[HeadingSpec]) -> std::result::Result<Self, regex::Error> {
        self.detector = HeadingDetector::new(sections)?;
        Ok(self)
    }

    pub fn with_required_headings(mut self, required: &[&str]) -> std::result::Result<Self, regex::Error> {
        self.validator = StructuralValidator::new(required)?;
        Ok(self)
    }

    pub fn with_heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run one request to completion.
    ///
    /// Returns the terminal event that was pushed, or `None` when the request
    /// was cancelled (client gone) and no terminal event was sent.
    pub async fn run<S>(&self, upstream: S, sink: PushSink, cancel: CancellationToken) -> Option<PushEvent>
    where
        S: Stream<Item = Result<String>>,
    {
        let mut tracker = Tracker::new();
        tracker.enter(StreamState::Streaming);

        if !sink.send(PushEvent::heartbeat()).await {
            return abandon(&mut tracker, &sink).await;
        }
        let heartbeat = Heartbeat::arm(sink.clone(), self.heartbeat_period, &cancel);

        let streamed = self
            .consume(upstream, &sink, &cancel, &tracker.request_id)
            .await;
        heartbeat.disarm().await;

        let terminal = match streamed {
            Ok(text) => {
                tracker.enter(StreamState::Validating);
                self.conclude(text, &mut tracker).await
            }
            Err(SopError::Cancelled) => return abandon(&mut tracker, &sink).await,
            Err(e) => {
                tracker.enter(StreamState::Error);
                warn!(request_id = %tracker.request_id, error = %e, "Upstream stream failed");
                PushEvent::error(e.to_string())
            }
        };

        if !sink.finish(terminal.clone()).await {
            debug!(request_id = %tracker.request_id, "Terminal event not delivered");
        }
        tracker.enter(StreamState::Done);
        Some(terminal)
    }

    /// Run a request whose text is already complete
    pub async fn run_text(
        &self,
        text: impl Into<String>,
        sink: PushSink,
        cancel: CancellationToken,
    ) -> Option<PushEvent> {
        let upstream = futures::stream::iter([Ok(text.into())]);
        self.run(upstream, sink, cancel).await
    }

    /// Parse, render and store a text that passed validation
    pub async fn publish(&self, text: &str) -> Result<StoredDocument> {
        self.publish_as(text, extract_title(text)).await
    }

    /// Like [`Orchestrator::publish`] with an explicit title
    pub async fn publish_as(&self, text: &str, title: String) -> Result<StoredDocument> {
        let blocks = parse(text);
        let bytes = render(&blocks, &FrontMatter::new(title.clone()))?;
        let filename = self
            .store
            .save(&bytes, &format!("{}.docx", slug(&title)))
            .await?;
        Ok(StoredDocument { title, filename })
    }

    async fn consume<S>(
        &self,
        upstream: S,
        sink: &PushSink,
        cancel: &CancellationToken,
        request_id: &str,
    ) -> Result<String>
    where
        S: Stream<Item = Result<String>>,
    {
        tokio::pin!(upstream);
        let mut detector = self.detector.clone();
        let mut text = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SopError::Cancelled),
                next = upstream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    text.push_str(&fragment);
                    for event in detector.observe(&fragment) {
                        debug!(request_id = %request_id, key = %event.key, "Section started");
                        if !sink.send(PushEvent::heading(event.label)).await {
                            return Err(SopError::Cancelled);
                        }
                    }
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        if text.trim().is_empty() {
            return Err(SopError::UpstreamClosed);
        }

        info!(
            request_id = %request_id,
            chars = text.len(),
            headings = detector.emitted_count(),
            "Upstream stream complete"
        );
        Ok(text)
    }

    async fn conclude(&self, text: String, tracker: &mut Tracker) -> PushEvent {
        let validation = match self.validator.validate(&text) {
            Ok(validation) => validation,
            Err(e) => {
                tracker.enter(StreamState::Error);
                return PushEvent::error(e.to_string());
            }
        };

        if !validation.is_valid {
            info!(
                request_id = %tracker.request_id,
                details = ?validation.details,
                "Response lacks required headings, returning text only"
            );
            return PushEvent::done(text, None);
        }

        tracker.enter(StreamState::Rendering);
        match self.publish(&text).await {
            Ok(doc) => {
                info!(request_id = %tracker.request_id, filename = %doc.filename, "Document ready");
                PushEvent::done(doc.status(), Some(doc.filename))
            }
            Err(e) => {
                error!(request_id = %tracker.request_id, error = %e, "Failed to produce document");
                PushEvent::done(text, None)
            }
        }
    }
}

async fn abandon(tracker: &mut Tracker, sink: &PushSink) -> Option<PushEvent> {
    info!(request_id = %tracker.request_id, "Client disconnected, abandoning request");
    sink.close().await;
    tracker.enter(StreamState::Done);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const VALID: &str = "# SOP: Rotate TLS Certificates\n\n## Purpose\nAvoid expiry.\n\n## Scope\nEdge proxies.\n\n## Architecture Overview\nLB -> Proxy\n\n## Procedure Steps\n1. Issue cert\n2. Reload proxy\n";

    async fn drain(mut rx: mpsc::Receiver<PushEvent>) -> Vec<PushEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn fragments(parts: &[&str]) -> impl Stream<Item = Result<String>> {
        futures::stream::iter(parts.iter().map(|p| Ok(p.to_string())).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_valid_text_produces_document() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, rx) = PushSink::channel(64);

        let terminal = orchestrator
            .run(fragments(&[&VALID[..40], &VALID[40..]]), sink, CancellationToken::new())
            .await
            .unwrap();
        let events = drain(rx).await;

        assert_eq!(events.first(), Some(&PushEvent::heartbeat()));
        assert_eq!(events.last(), Some(&terminal));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

        match terminal {
            PushEvent::Done { response, doc_path: Some(filename), .. } => {
                assert_eq!(response, "✅ SOP \"SOP: Rotate TLS Certificates\" created Successfully");
                assert!(filename.ends_with("_SOP_Rotate_TLS_Certificates.docx"));
                assert!(tmp.path().join(&filename).is_file());
            }
            other => panic!("unexpected terminal event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_headings_precede_terminal() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, rx) = PushSink::channel(64);

        orchestrator.run(fragments(&[VALID]), sink, CancellationToken::new()).await;
        let events = drain(rx).await;

        let headings: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PushEvent::Heading { heading } => Some(heading.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                "Defining the purpose",
                "Mapping scope and affected systems",
                "Sketching the architecture",
                "Writing procedure steps",
            ]
        );
        assert!(events.last().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_invalid_text_returns_raw_text() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, rx) = PushSink::channel(64);
        let text = "Hello! Happy to help.\n\nSOP was not required for this query.";

        let terminal = orchestrator
            .run_text(text, sink, CancellationToken::new())
            .await;
        assert_eq!(terminal, Some(PushEvent::done(text, None)));

        let events = drain(rx).await;
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_is_single_error_event() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, rx) = PushSink::channel(64);

        let upstream = futures::stream::iter(vec![
            Ok("## Purpose\n".to_string()),
            Err(SopError::Upstream {
                status: 502,
                body: "bad gateway".into(),
            }),
            Ok("## Scope\n".to_string()),
        ]);
        let terminal = orchestrator
            .run(upstream, sink, CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(terminal, PushEvent::Error { ref error } if error.contains("502")));

        let events = drain(rx).await;
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(!events.contains(&PushEvent::heading("Mapping scope and affected systems")));
    }

    #[tokio::test]
    async fn test_empty_upstream_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, _rx) = PushSink::channel(64);

        let terminal = orchestrator
            .run(fragments(&[]), sink, CancellationToken::new())
            .await;
        assert!(matches!(terminal, Some(PushEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_store_failure_still_terminates() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(&blocker));
        let (sink, rx) = PushSink::channel(64);

        let terminal = orchestrator
            .run_text(VALID, sink, CancellationToken::new())
            .await;
        assert_eq!(terminal, Some(PushEvent::done(VALID, None)));
        assert_eq!(drain(rx).await.last(), Some(&PushEvent::done(VALID, None)));
    }

    #[tokio::test]
    async fn test_cancelled_request_sends_no_terminal() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
        let (sink, rx) = PushSink::channel(64);
        let cancel = CancellationToken::new();

        let (tx, upstream_rx) = mpsc::channel::<Result<String>>(4);
        tx.send(Ok("## Purpose\n".into())).await.unwrap();
        let upstream = tokio_stream::wrappers::ReceiverStream::new(upstream_rx);

        let task = {
            let orchestrator = orchestrator.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { orchestrator.run(upstream, sink, cancel).await })
        };
        tokio::task::yield_now().await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), None);
        assert!(drain(rx).await.iter().all(|e| !e.is_terminal()));
        drop(tx);
    }

    #[tokio::test]
    async fn test_custom_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()))
            .with_sections(&[HeadingSpec::new("Overview", "Summarising")])
            .unwrap()
            .with_required_headings(&["Overview"])
            .unwrap();
        let (sink, rx) = PushSink::channel(64);

        let terminal = orchestrator
            .run_text("# Quick Note\n## Overview\nShort.\n", sink, CancellationToken::new())
            .await;
        assert!(matches!(terminal, Some(PushEvent::Done { doc_path: Some(_), .. })));
        assert!(drain(rx).await.contains(&PushEvent::heading("Summarising")));
    }

    #[tokio::test]
    async fn test_publish_as_overrides_title() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));

        let doc = orchestrator
            .publish_as(VALID, "Edge Cert Rotation".to_string())
            .await
            .unwrap();
        assert_eq!(doc.title, "Edge Cert Rotation");
        assert!(doc.filename.ends_with("_Edge_Cert_Rotation.docx"));
        assert!(orchestrator.store().resolve(&doc.filename).unwrap().is_file());
    }
}
