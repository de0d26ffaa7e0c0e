//! Markdown subset parser
//!
//! Line-oriented scanner over the physical lines of a text. Recognises
//! headings, numbered/bullet runs, pipe tables, fenced code and paragraphs
//! with bold spans. Malformed constructs degrade to paragraphs; the parser
//! never fails.

use once_cell::sync::Lazy;
use regex::Regex;

use super::blocks::Block;
use super::inline;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static ORDERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap());
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*•]\s+(.*)$").unwrap());

const FENCE: &str = "```";
const DEFAULT_CODE_LANGUAGE: &str = "text";

/// Parse a full text into its block sequence
pub fn parse(text: &str) -> Vec<Block> {
    BlockParser::new(text).collect()
}

/// Scanner state carried between `next()` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    /// Inside a run of list lines of one kind
    InList { ordered: bool },
}

/// Lazy block iterator over an index cursor into the line array
pub struct BlockParser<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
    state: ScanState,
}

impl<'a> BlockParser<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        Self {
            lines,
            cursor: 0,
            state: ScanState::Scanning,
        }
    }

    fn line(&self, idx: usize) -> &'a str {
        self.lines[idx].trim()
    }

    /// Collect the contiguous run of table-looking lines starting at the cursor.
    /// Returns the table and the index after the run, or None for a run shorter
    /// than two lines.
    fn take_table(&self) -> Option<(Block, usize)> {
        let end = (self.cursor..self.lines.len())
            .find(|&idx| !looks_like_table_row(self.line(idx)))
            .unwrap_or(self.lines.len());

        if end - self.cursor < 2 {
            return None;
        }

        let mut rows: Vec<Vec<String>> = (self.cursor..end)
            .map(|idx| split_row(self.line(idx)))
            .collect();

        let headers = rows.remove(0);
        if rows.first().is_some_and(|row| is_separator_row(row)) {
            rows.remove(0);
        }

        Some((Block::Table { headers, rows }, end))
    }

    /// Consume a fenced code block starting at the cursor.
    /// Returns None when no closing fence exists before the end of input.
    fn take_code_block(&self) -> Option<(Block, usize)> {
        let opening = self.line(self.cursor);
        let language = match opening[FENCE.len()..].trim() {
            "" => DEFAULT_CODE_LANGUAGE.to_string(),
            lang => lang.to_string(),
        };

        let body_start = self.cursor + 1;
        let close = (body_start..self.lines.len()).find(|&idx| self.line(idx).starts_with(FENCE))?;

        let lines = self.lines[body_start..close]
            .iter()
            .map(|line| line.to_string())
            .collect();

        Some((Block::CodeBlock { language, lines }, close + 1))
    }
}

impl Iterator for BlockParser<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        while self.cursor < self.lines.len() {
            let line = self.line(self.cursor);

            if let ScanState::InList { ordered } = self.state {
                if let Some(text) = list_item_text(line, ordered) {
                    self.cursor += 1;
                    return Some(Block::ListItem {
                        ordered,
                        text: text.to_string(),
                    });
                }
                self.state = ScanState::Scanning;
            }

            if line.is_empty() {
                self.cursor += 1;
                continue;
            }

            if let Some(caps) = HEADING_RE.captures(line) {
                self.cursor += 1;
                return Some(Block::Heading {
                    level: caps[1].len() as u8,
                    text: caps[2].trim().to_string(),
                });
            }

            if ORDERED_RE.is_match(line) {
                self.state = ScanState::InList { ordered: true };
                continue;
            }

            if BULLET_RE.is_match(line) {
                self.state = ScanState::InList { ordered: false };
                continue;
            }

            if looks_like_table_row(line) {
                if let Some((table, next)) = self.take_table() {
                    self.cursor = next;
                    return Some(table);
                }
            } else if line.starts_with(FENCE) {
                match self.take_code_block() {
                    Some((code, next)) => {
                        self.cursor = next;
                        return Some(code);
                    }
                    None => {
                        // Unterminated fence: drop the opening line only
                        self.cursor += 1;
                        continue;
                    }
                }
            }

            self.cursor += 1;
            return Some(Block::Paragraph {
                runs: inline::tokenize(line),
            });
        }

        None
    }
}

fn list_item_text(line: &str, ordered: bool) -> Option<&str> {
    let re = if ordered { &ORDERED_RE } else { &BULLET_RE };
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn looks_like_table_row(line: &str) -> bool {
    line.matches('|').count() >= 2
}

/// Split a pipe row into trimmed cells, dropping the empty cells produced by
/// outer pipes
fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    cells.into_iter().map(String::from).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|cell| cell.replace(['-', ':'], "").trim().is_empty())
}
