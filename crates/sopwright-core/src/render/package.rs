//! OOXML package assembly
//!
//! A `.docx` is a zip of XML parts. Everything except the document body,
//! the numbering instances and the core properties is fixed.

use std::fmt::Write as _;
use std::io::{Cursor, Write as _};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::xml::escape;
use crate::error::Result;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/></Relationships>"#;

const HEADING_COLOR: &str = "2E74B5";

/// `(size in half-points, spacing before, spacing after)` for Heading1..Heading6
const HEADING_METRICS: [(u32, u32, u32); 6] = [
    (32, 360, 120),
    (28, 240, 120),
    (26, 200, 100),
    (24, 200, 100),
    (22, 160, 80),
    (22, 160, 80),
];

pub(crate) fn styles_xml() -> Result<String> {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );

    out.push_str(r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#);

    out.push_str(r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#);

    write!(
        out,
        r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:before="240" w:after="240"/><w:jc w:val="center"/></w:pPr><w:rPr><w:b/><w:color w:val="{HEADING_COLOR}"/><w:sz w:val="48"/><w:szCs w:val="48"/></w:rPr></w:style>"#
    )?;

    for (idx, (size, before, after)) in HEADING_METRICS.iter().enumerate() {
        let level = idx + 1;
        write!(
            out,
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="{before}" w:after="{after}"/><w:outlineLvl w:val="{idx}"/></w:pPr><w:rPr><w:b/><w:color w:val="{HEADING_COLOR}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:style>"#
        )?;
    }

    out.push_str(r#"<w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="60"/><w:ind w:left="720"/></w:pPr></w:style>"#);

    out.push_str(r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#);

    out.push_str("</w:styles>");
    Ok(out)
}

/// `numId` shared by every bullet item
pub const BULLET_NUM_ID: u32 = 1;

const BULLET_ABSTRACT: u32 = 0;
const DECIMAL_ABSTRACT: u32 = 1;

/// Numbering definitions: one bullet instance plus one decimal instance per
/// run of ordered items, each restarting at 1
#[derive(Debug, Default)]
pub struct Numbering {
    ordered_instances: Vec<u32>,
}

impl Numbering {
    /// Allocate a fresh decimal list starting at 1
    pub fn next_ordered(&mut self) -> u32 {
        let num_id = BULLET_NUM_ID + 1 + self.ordered_instances.len() as u32;
        self.ordered_instances.push(num_id);
        num_id
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut out = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        );

        write!(
            out,
            r#"<w:abstractNum w:abstractNumId="{BULLET_ABSTRACT}"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#
        )?;
        write!(
            out,
            r#"<w:abstractNum w:abstractNumId="{DECIMAL_ABSTRACT}"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#
        )?;

        write!(
            out,
            r#"<w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="{BULLET_ABSTRACT}"/></w:num>"#
        )?;
        for num_id in &self.ordered_instances {
            write!(
                out,
                r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="{DECIMAL_ABSTRACT}"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#
            )?;
        }

        out.push_str("</w:numbering>");
        Ok(out)
    }
}

pub(crate) fn core_props_xml(title: &str, creator: &str, created: &str) -> Result<String> {
    let mut out = String::new();
    write!(
        out,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:creator>{creator}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified></cp:coreProperties>"#,
        title = escape(title),
        creator = escape(creator),
    )?;
    Ok(out)
}

/// The variable parts of a package
pub(crate) struct Parts {
    pub document: String,
    pub numbering: String,
    pub core_props: String,
}

/// Zip all parts into an in-memory `.docx`
pub(crate) fn assemble(parts: Parts) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let styles = styles_xml()?;

    let entries: [(&str, &str); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", &parts.document),
        ("word/styles.xml", &styles),
        ("word/numbering.xml", &parts.numbering),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ("docProps/core.xml", &parts.core_props),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_instances_restart() {
        let mut numbering = Numbering::default();
        assert_eq!(numbering.next_ordered(), 2);
        assert_eq!(numbering.next_ordered(), 3);

        let xml = numbering.to_xml().unwrap();
        assert_eq!(xml.matches("<w:num ").count(), 3);
        assert_eq!(xml.matches(r#"<w:startOverride w:val="1"/>"#).count(), 2);
        // Definitions must precede instances
        assert!(xml.rfind("<w:abstractNum ").unwrap() < xml.find("<w:num ").unwrap());
    }

    #[test]
    fn test_styles_define_every_heading_level() {
        let xml = styles_xml().unwrap();
        for level in 1..=6 {
            assert!(xml.contains(&format!(r#"w:styleId="Heading{level}""#)));
        }
        assert!(xml.contains(r#"w:styleId="TableGrid""#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
    }

    #[test]
    fn test_core_props_escape_title() {
        let xml = core_props_xml("Backup & Restore", "System Generated", "2026-01-01T00:00:00Z").unwrap();
        assert!(xml.contains("<dc:title>Backup &amp; Restore</dc:title>"));
    }
}
