//! DOCX rendering
//!
//! Lays out a parsed block sequence as a Word document: title page, table of
//! contents placeholder, the content itself, and a revision-history appendix.

mod package;
mod xml;

use chrono::{DateTime, Local, Utc};
use tracing::debug;

use package::{Numbering, Parts, BULLET_NUM_ID};
use xml::{write_page_break, Paragraph, Run, Table};

use crate::document::{Block, TextRun};
use crate::error::Result;

/// Usable text width of a US Letter page with 1" margins, in twips
const TEXT_WIDTH: u32 = 12_240 - 2 * MARGIN;
const MARGIN: u32 = 1_440;

const SUBTITLE: &str = "Standard Operating Procedure";
const AUTHOR: &str = "System Generated";
const MUTED: &str = "666666";
const CODE_COLOR: &str = "2E8B57";
const CODE_FONT: &str = "Courier New";

/// Title-page metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub document_id: String,
    pub version: String,
    /// Short local date, `M/D/YYYY`
    pub effective_date: String,
    /// W3C timestamp for the package properties
    pub created: String,
}

impl FrontMatter {
    /// Front matter stamped with the current time
    pub fn new(title: impl Into<String>) -> Self {
        Self::at(title, Local::now())
    }

    pub fn at(title: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            title: title.into(),
            document_id: format!("SOP-{:06}", now.timestamp_millis().rem_euclid(1_000_000)),
            version: "1.0".to_string(),
            effective_date: now.format("%-m/%-d/%Y").to_string(),
            created: now
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        }
    }
}

/// Render `blocks` into the bytes of a `.docx` file
pub fn render(blocks: &[Block], front: &FrontMatter) -> Result<Vec<u8>> {
    let mut doc = DocumentBuilder::default();
    doc.front_matter(front)?;
    doc.contents()?;
    for block in blocks {
        doc.block(block)?;
    }
    doc.appendix(front)?;

    debug!(blocks = blocks.len(), title = %front.title, "Rendering document");

    package::assemble(Parts {
        document: doc.finish(),
        numbering: doc.numbering.to_xml()?,
        core_props: package::core_props_xml(&front.title, AUTHOR, &front.created)?,
    })
}

#[derive(Default)]
struct DocumentBuilder {
    body: String,
    numbering: Numbering,
    /// `numId` of the ordered list currently being continued
    open_ordered: Option<u32>,
}

impl DocumentBuilder {
    fn push(&mut self, paragraph: Paragraph) -> Result<()> {
        paragraph.write_to(&mut self.body)?;
        Ok(())
    }

    fn front_matter(&mut self, front: &FrontMatter) -> Result<()> {
        self.push(
            Paragraph::styled("Title")
                .centered()
                .spacing(2_400, 400)
                .run(Run::new(&front.title)),
        )?;
        self.push(
            Paragraph::new()
                .centered()
                .spacing(0, 300)
                .run(Run::new(SUBTITLE).size(28).color(MUTED)),
        )?;

        for (label, value) in [
            ("Document ID", front.document_id.as_str()),
            ("Version", front.version.as_str()),
            ("Effective Date", front.effective_date.as_str()),
        ] {
            self.push(
                Paragraph::new()
                    .centered()
                    .spacing(0, 120)
                    .run(Run::new(format!("{label}: ")).bold(true))
                    .run(Run::new(value)),
            )?;
        }

        write_page_break(&mut self.body);
        Ok(())
    }

    fn contents(&mut self) -> Result<()> {
        self.push(Paragraph::styled("Heading1").run(Run::new("Table of Contents")))?;
        self.push(
            Paragraph::new().spacing(0, 240).run(
                Run::new("[Table of Contents will be generated automatically in Word]")
                    .italic()
                    .color(MUTED),
            ),
        )
    }

    fn block(&mut self, block: &Block) -> Result<()> {
        if !matches!(block, Block::ListItem { ordered: true, .. }) {
            self.open_ordered = None;
        }

        match block {
            Block::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                self.push(Paragraph::styled(format!("Heading{level}")).run(Run::new(text)))
            }
            Block::Paragraph { runs } => {
                let paragraph = runs.iter().fold(Paragraph::new(), |p, run| p.run(text_run(run)));
                self.push(paragraph)
            }
            Block::ListItem { ordered, text } => {
                let num_id = if *ordered {
                    match self.open_ordered {
                        Some(num_id) => num_id,
                        None => {
                            let num_id = self.numbering.next_ordered();
                            self.open_ordered = Some(num_id);
                            num_id
                        }
                    }
                } else {
                    BULLET_NUM_ID
                };
                self.push(
                    Paragraph::styled("ListParagraph")
                        .numbered(num_id)
                        .run(Run::new(text)),
                )
            }
            Block::Table { headers, rows } => {
                Table {
                    headers,
                    rows,
                    width: TEXT_WIDTH,
                }
                .write_to(&mut self.body)?;
                Ok(())
            }
            Block::CodeBlock { language, lines } => self.code_block(language, lines),
        }
    }

    fn code_block(&mut self, language: &str, lines: &[String]) -> Result<()> {
        self.push(
            Paragraph::new()
                .spacing(120, 0)
                .run(Run::new(format!("Code ({language}):")).bold(true).color(MUTED)),
        )?;
        self.push(
            Paragraph::new().boxed().spacing(60, 200).run(
                Run::new(lines.join("\n"))
                    .font(CODE_FONT)
                    .size(20)
                    .color(CODE_COLOR),
            ),
        )
    }

    fn appendix(&mut self, front: &FrontMatter) -> Result<()> {
        self.push(
            Paragraph::styled("Heading1")
                .page_break_before()
                .run(Run::new("Appendix: Revision History")),
        )?;

        let headers = ["Version", "Date", "Description", "Author"].map(String::from);
        let rows = [vec![
            front.version.clone(),
            front.effective_date.clone(),
            "Initial Release".to_string(),
            AUTHOR.to_string(),
        ]];
        Table {
            headers: &headers,
            rows: &rows,
            width: TEXT_WIDTH,
        }
        .write_to(&mut self.body)?;

        // A body must not end on a table
        self.push(Paragraph::new())
    }

    fn finish(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
            body = self.body,
            m = MARGIN,
        )
    }
}

fn text_run(run: &TextRun) -> Run {
    Run::new(&run.text).bold(run.bold)
}
