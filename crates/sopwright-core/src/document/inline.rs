//! Inline bold tokenizer
//!
//! Splits a line on `**` / `__` delimiters. Each delimiter toggles the bold
//! flag; delimiters do not nest and an unbalanced line leaves its tail in the
//! last toggled state.

use super::blocks::TextRun;

const DELIMITERS: [&str; 2] = ["**", "__"];

/// Tokenize a single line into alternating plain/bold runs
pub fn tokenize(line: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut bold = false;
    let mut rest = line;

    while let Some((idx, delim)) = next_delimiter(rest) {
        push_run(&mut runs, &rest[..idx], bold);
        bold = !bold;
        rest = &rest[idx + delim.len()..];
    }
    push_run(&mut runs, rest, bold);

    runs
}

fn next_delimiter(text: &str) -> Option<(usize, &'static str)> {
    DELIMITERS
        .iter()
        .filter_map(|d| text.find(d).map(|idx| (idx, *d)))
        .min_by_key(|(idx, _)| *idx)
}

fn push_run(runs: &mut Vec<TextRun>, text: &str, bold: bool) {
    // Empty fragments between adjacent delimiters are dropped
    if !text.is_empty() {
        runs.push(if bold {
            TextRun::bold(text)
        } else {
            TextRun::plain(text)
        });
    }
}
