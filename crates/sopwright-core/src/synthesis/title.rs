//! Document title extraction and filename slugs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::store::random_id;

static LEADING_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A#\s*(.+)").unwrap());
static SOP_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)SOP:\s*(.+)").unwrap());
static CLIPBOARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"📋\s*(.+)").unwrap());

/// Byte budget for a slug; the stored name adds a 22-byte id prefix and
/// `.docx`, and file names are limited to 255 bytes
const MAX_SLUG_BYTES: usize = 200;

/// Pick a document title from the response text.
///
/// Tries a heading on the very first line, then any `SOP:` label, then a
/// clipboard-marked line; falls back to a random `SOP - <id>` title.
pub fn extract_title(content: &str) -> String {
    let found = [&LEADING_HEADING_RE, &SOP_LABEL_RE, &CLIPBOARD_RE]
        .iter()
        .find_map(|re| re.captures(content).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().replace('📋', ""));

    let title = match found {
        Some(raw) => raw.trim().replace(['#', '$', '@', '%'], ""),
        None => format!("SOP - {}", random_id()),
    };

    match title.trim() {
        "" => format!("SOP - {}", random_id()),
        trimmed => trimmed.to_string(),
    }
}

/// Turn a title into a filesystem-safe file stem: whitespace runs become `_`,
/// anything other than letters, digits and `-_.()` is dropped
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    let mut pending_sep = false;

    for c in title.trim().chars() {
        if c.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')')) {
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(c);
    }

    let out = truncate_bytes(out.trim_start_matches('.'), MAX_SLUG_BYTES).trim_end_matches('_');
    if out.is_empty() {
        "SOP".to_string()
    } else {
        out.to_string()
    }
}

/// Longest prefix of `text` within `max` bytes that ends on a char boundary
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let end = (0..=max).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
    &text[..end]
}
