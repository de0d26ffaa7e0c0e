//! End-to-end runs of the synthesis pipeline over in-memory fragment streams

use std::io::{Cursor, Read};

use sopwright_core::ai::sse::{SseDecoder, SseEvent};
use sopwright_core::document::{parse, Block};
use sopwright_core::store::ArtifactStore;
use sopwright_core::{Orchestrator, PushEvent, PushSink, RequestCancellation, Result};
use tokio::sync::mpsc;

const SOP: &str = "\
# SOP: Backup and Restore PostgreSQL

## Purpose
Protect **production** data against loss.

## Scope
Primary cluster and replicas.

## Responsibilities
- DBA on call
- Platform lead

## Architecture Overview
App -> PgBouncer -> Postgres

## Data Model / Tables Affected
| Table | Purpose |
|-------|---------|
| backups | Backup catalogue |

## Procedure Steps
1. Freeze writes
2. Run the dump
3. Verify checksum

```bash
pg_dump -Fc prod > prod.dump
```

## Rollback Plan
Restore the previous dump.
";

/// Split text into fragments of `size` characters
fn chunk(text: &str, size: usize) -> Vec<Result<String>> {
    text.chars()
        .collect::<Vec<_>>()
        .chunks(size)
        .map(|c| Ok(c.iter().collect()))
        .collect()
}

async fn drain(mut rx: mpsc::Receiver<PushEvent>) -> Vec<PushEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

fn document_xml(bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

#[tokio::test]
async fn test_valid_sop_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path().join("temp")));
    let (sink, rx) = PushSink::channel(128);
    let cancel = RequestCancellation::new();

    let upstream = futures::stream::iter(chunk(SOP, 7));
    let terminal = orchestrator
        .run(upstream, sink, cancel.child_token())
        .await
        .expect("terminal event");
    let events = drain(rx).await;

    // Exactly one terminal event, and it is last
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(events.last(), Some(&terminal));

    let headings: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            PushEvent::Heading { heading } => Some(heading.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(headings.len(), 7);
    assert_eq!(headings.first(), Some(&"Defining the purpose"));
    assert_eq!(headings.last(), Some(&"Preparing the rollback plan"));

    let PushEvent::Done {
        doc_path: Some(filename),
        response,
        ..
    } = terminal.clone()
    else {
        panic!("expected a document, got {terminal:?}");
    };
    assert!(response.contains("Backup and Restore PostgreSQL"));

    let path = orchestrator.store().resolve(&filename).unwrap();
    let xml = document_xml(&std::fs::read(path).unwrap());
    assert!(xml.contains("Protect "));
    assert!(xml.contains("Backup catalogue"));
    assert!(xml.contains("pg_dump -Fc prod &gt; prod.dump"));
    assert!(xml.contains("Code (bash):"));
    assert!(xml.contains("Appendix: Revision History"));
}

#[tokio::test]
async fn test_conversational_reply_has_no_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
    let (sink, rx) = PushSink::channel(128);
    let text = "Hi! A **primary key** uniquely identifies a row.\n\nSOP was not required for this query.";

    orchestrator
        .run(futures::stream::iter(chunk(text, 5)), sink, RequestCancellation::new().child_token())
        .await;
    let events = drain(rx).await;

    let terminals: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminals, vec![&PushEvent::done(text, None)]);
    assert!(!events.iter().any(|e| matches!(e, PushEvent::Heading { .. })));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_sse_body_through_orchestrator() {
    // Raw upstream bytes, split at awkward offsets
    let mut body = String::new();
    for piece in chunk(SOP, 11) {
        let piece = piece.unwrap();
        body.push_str(&format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": piece}}]})
        ));
    }
    body.push_str("data: [DONE]\n\n");

    let mut decoder = SseDecoder::new();
    let mut fragments = Vec::new();
    for raw in body.as_bytes().chunks(13) {
        for event in decoder.push(raw) {
            match event {
                SseEvent::TextDelta(text) => fragments.push(Ok(text)),
                SseEvent::Done => {}
                SseEvent::Error(e) => panic!("unexpected error {e}"),
            }
        }
    }

    let joined: String = fragments.iter().map(|f: &Result<String>| f.as_ref().unwrap().as_str()).collect();
    assert_eq!(joined, SOP);

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
    let (sink, _rx) = PushSink::channel(256);
    let terminal = orchestrator
        .run(futures::stream::iter(fragments), sink, RequestCancellation::new().child_token())
        .await;
    assert!(matches!(terminal, Some(PushEvent::Done { doc_path: Some(_), .. })));
}

#[tokio::test]
async fn test_long_multibyte_title_still_stores_artifact() {
    let title = "数据库备份与恢复标准操作流程".repeat(6);
    let text = format!(
        "# SOP: {title}\n\n## Purpose\n保护数据。\n\n## Scope\n主库。\n\n## Architecture Overview\nApp -> DB\n\n## Procedure Steps\n1. 备份\n"
    );

    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(ArtifactStore::new(tmp.path()));
    let (sink, _rx) = PushSink::channel(64);
    let terminal = orchestrator
        .run_text(text, sink, RequestCancellation::new().child_token())
        .await;

    let Some(PushEvent::Done { doc_path: Some(filename), .. }) = terminal.clone() else {
        panic!("valid SOP produced no artifact: {terminal:?}");
    };
    assert!(filename.len() <= 255);
    assert!(orchestrator.store().resolve(&filename).unwrap().is_file());
}

#[test]
fn test_parse_keeps_source_order() {
    let blocks = parse(SOP);
    let kinds: Vec<&str> = blocks
        .iter()
        .map(|b| match b {
            Block::Heading { .. } => "h",
            Block::Paragraph { .. } => "p",
            Block::ListItem { .. } => "li",
            Block::Table { .. } => "t",
            Block::CodeBlock { .. } => "c",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "h", "h", "p", "h", "p", "h", "li", "li", "h", "p", "h", "t", "h", "li", "li", "li",
            "c", "h", "p"
        ]
    );
}
