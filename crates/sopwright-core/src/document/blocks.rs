//! Document block types
//!
//! Flat, order-preserving block model shared by the parser and the renderer.

use serde::Serialize;

/// Block-level document elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Heading with level (1-6)
    Heading { level: u8, text: String },
    /// Paragraph made of plain/bold runs
    Paragraph { runs: Vec<TextRun> },
    /// Single list line; consecutive items of the same kind form a visual list
    ListItem { ordered: bool, text: String },
    /// Pipe table; headers may be empty
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Fenced code block
    CodeBlock { language: String, lines: Vec<String> },
}

/// A run of paragraph text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let block = Block::ListItem {
            ordered: true,
            text: "step".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "list_item");
        assert_eq!(json["ordered"], true);
    }
}
