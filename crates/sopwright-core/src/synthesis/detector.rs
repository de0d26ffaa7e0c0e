//! Heading progress detection over a streamed response
//!
//! Keeps a bounded tail of the stream so headings split across fragments are
//! still seen, without retaining the whole document.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::debug;

use super::sections::{HeadingSpec, SectionMatcher, SOP_SECTIONS};

static STANDARD_DETECTOR: Lazy<HeadingDetector> = Lazy::new(|| {
    HeadingDetector::new(SOP_SECTIONS).expect("section keys are escaped literals")
});

/// Maximum number of characters retained between fragments
pub const TAIL_WINDOW: usize = 500;

/// A section heading seen for the first time in this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEvent {
    pub key: String,
    pub label: String,
}

/// Stateful scanner, one per generation attempt
#[derive(Debug, Clone)]
pub struct HeadingDetector {
    matchers: Vec<(HeadingSpec, SectionMatcher)>,
    /// Rolling tail of the stream, at most `TAIL_WINDOW` characters
    tail: String,
    emitted: HashSet<&'static str>,
}

impl HeadingDetector {
    pub fn new(table: &[HeadingSpec]) -> Result<Self, regex::Error> {
        let matchers = table
            .iter()
            .map(|spec| SectionMatcher::streaming(spec.key).map(|m| (*spec, m)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            matchers,
            tail: String::new(),
            emitted: HashSet::new(),
        })
    }

    /// Fresh detector over the standard SOP section table
    pub fn standard() -> Self {
        STANDARD_DETECTOR.clone()
    }

    /// Feed the next fragment; returns headings seen for the first time, in
    /// label table order
    pub fn observe(&mut self, fragment: &str) -> Vec<HeadingEvent> {
        self.tail.push_str(fragment);

        let mut events = Vec::new();
        for (spec, matcher) in &self.matchers {
            if self.emitted.contains(spec.key) || !matcher.is_match(&self.tail) {
                continue;
            }
            self.emitted.insert(spec.key);
            debug!(key = spec.key, "Section heading detected");
            events.push(HeadingEvent {
                key: spec.key.to_string(),
                label: spec.label.to_string(),
            });
        }

        truncate_front(&mut self.tail, TAIL_WINDOW);
        events
    }

    /// Keys emitted so far
    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }
}

/// Keep at most `max_chars` trailing characters. When the cut lands inside a
/// line, the rest of that (already scanned) line is dropped too so the buffer
/// always starts at a line boundary.
fn truncate_front(buf: &mut String, max_chars: usize) {
    let count = buf.chars().count();
    if count <= max_chars {
        return;
    }

    let mut cut = buf
        .char_indices()
        .nth(count - max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    if !buf[..cut].ends_with('\n') {
        if let Some(nl) = buf[cut..].find('\n') {
            cut += nl + 1;
        }
    }

    buf.drain(..cut);
}
