//! WordprocessingML fragment builders

use std::borrow::Cow;
use std::fmt::Write;

/// Escape text for element content / attribute values, dropping characters
/// XML 1.0 cannot carry
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'') || is_forbidden(c))
    {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_forbidden(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_forbidden(c: char) -> bool {
    (c < ' ' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// A text run with direct formatting
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<&'static str>,
    /// Font size in half-points
    pub size: Option<u32>,
    pub font: Option<&'static str>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: &'static str) -> Self {
        self.color = Some(color);
        self
    }

    pub fn size(mut self, half_points: u32) -> Self {
        self.size = Some(half_points);
        self
    }

    pub fn font(mut self, font: &'static str) -> Self {
        self.font = Some(font);
        self
    }

    pub fn write_to(&self, out: &mut String) -> std::fmt::Result {
        out.push_str("<w:r>");
        self.write_props(out)?;

        // Embedded newlines become line breaks inside the run
        for (idx, line) in self.text.split('\n').enumerate() {
            if idx > 0 {
                out.push_str("<w:br/>");
            }
            write!(out, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line))?;
        }

        out.push_str("</w:r>");
        Ok(())
    }

    fn write_props(&self, out: &mut String) -> std::fmt::Result {
        if !(self.bold || self.italic) && self.color.is_none() && self.size.is_none() && self.font.is_none()
        {
            return Ok(());
        }

        out.push_str("<w:rPr>");
        if let Some(font) = self.font {
            write!(
                out,
                r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
            )?;
        }
        if self.bold {
            out.push_str("<w:b/>");
        }
        if self.italic {
            out.push_str("<w:i/>");
        }
        if let Some(color) = self.color {
            write!(out, r#"<w:color w:val="{color}"/>"#)?;
        }
        if let Some(size) = self.size {
            write!(out, r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#)?;
        }
        out.push_str("</w:rPr>");
        Ok(())
    }
}

/// A paragraph with its properties and runs
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    pub style: Option<String>,
    pub page_break_before: bool,
    /// `numId` of the list this paragraph belongs to (level 0)
    pub num_id: Option<u32>,
    /// Boxed and shaded, used for code
    pub boxed: bool,
    /// Spacing before/after in twips
    pub spacing: Option<(u32, u32)>,
    pub centered: bool,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(style: impl Into<String>) -> Self {
        Self {
            style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing = Some((before, after));
        self
    }

    pub fn page_break_before(mut self) -> Self {
        self.page_break_before = true;
        self
    }

    pub fn numbered(mut self, num_id: u32) -> Self {
        self.num_id = Some(num_id);
        self
    }

    pub fn boxed(mut self) -> Self {
        self.boxed = true;
        self
    }

    pub fn write_to(&self, out: &mut String) -> std::fmt::Result {
        out.push_str("<w:p>");
        self.write_props(out)?;
        for run in &self.runs {
            run.write_to(out)?;
        }
        out.push_str("</w:p>");
        Ok(())
    }

    // Child order follows the CT_PPr sequence
    fn write_props(&self, out: &mut String) -> std::fmt::Result {
        let mut props = String::new();
        if let Some(style) = &self.style {
            write!(props, r#"<w:pStyle w:val="{}"/>"#, escape(style))?;
        }
        if self.page_break_before {
            props.push_str("<w:pageBreakBefore/>");
        }
        if let Some(num_id) = self.num_id {
            write!(
                props,
                r#"<w:numPr><w:ilvl w:val="0"/><w:numId w:val="{num_id}"/></w:numPr>"#
            )?;
        }
        if self.boxed {
            props.push_str("<w:pBdr>");
            for side in ["top", "left", "bottom", "right"] {
                write!(
                    props,
                    r#"<w:{side} w:val="single" w:sz="4" w:space="4" w:color="CCCCCC"/>"#
                )?;
            }
            props.push_str("</w:pBdr>");
            props.push_str(r#"<w:shd w:val="clear" w:color="auto" w:fill="F5F5F5"/>"#);
        }
        if let Some((before, after)) = self.spacing {
            write!(props, r#"<w:spacing w:before="{before}" w:after="{after}"/>"#)?;
        }
        if self.centered {
            props.push_str(r#"<w:jc w:val="center"/>"#);
        }

        if !props.is_empty() {
            write!(out, "<w:pPr>{props}</w:pPr>")?;
        }
        Ok(())
    }
}

/// Paragraph holding nothing but a hard page break
pub fn write_page_break(out: &mut String) {
    out.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
}

/// Grid table with an optional shaded header row
#[derive(Debug, Clone)]
pub struct Table<'a> {
    pub headers: &'a [String],
    pub rows: &'a [Vec<String>],
    /// Usable text width in twips
    pub width: u32,
}

impl Table<'_> {
    /// Column count: the header width, or the widest row when there is no header
    pub fn columns(&self) -> usize {
        if self.headers.is_empty() {
            self.rows.iter().map(Vec::len).max().unwrap_or(0)
        } else {
            self.headers.len()
        }
    }

    /// Writes nothing for a table without any columns
    pub fn write_to(&self, out: &mut String) -> std::fmt::Result {
        let columns = self.columns();
        if columns == 0 {
            return Ok(());
        }
        let col_width = self.width / columns as u32;

        out.push_str("<w:tbl><w:tblPr>");
        out.push_str(r#"<w:tblStyle w:val="TableGrid"/><w:tblW w:w="5000" w:type="pct"/>"#);
        out.push_str("<w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            write!(
                out,
                r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#
            )?;
        }
        out.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
        for _ in 0..columns {
            write!(out, r#"<w:gridCol w:w="{col_width}"/>"#)?;
        }
        out.push_str("</w:tblGrid>");

        if !self.headers.is_empty() {
            out.push_str("<w:tr><w:trPr><w:tblHeader/></w:trPr>");
            for header in self.headers {
                write_cell(out, header, col_width, true)?;
            }
            out.push_str("</w:tr>");
        }

        for row in self.rows {
            out.push_str("<w:tr>");
            for idx in 0..columns {
                let text = row.get(idx).map(String::as_str).unwrap_or("");
                write_cell(out, text, col_width, false)?;
            }
            out.push_str("</w:tr>");
        }

        out.push_str("</w:tbl>");
        Ok(())
    }
}

fn write_cell(out: &mut String, text: &str, width: u32, header: bool) -> std::fmt::Result {
    write!(out, r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/>"#)?;
    if header {
        out.push_str(r#"<w:shd w:val="clear" w:color="auto" w:fill="E7E6E6"/>"#);
    }
    out.push_str("</w:tcPr>");
    Paragraph::new()
        .run(Run::new(text).bold(header))
        .write_to(out)?;
    out.push_str("</w:tc>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
        assert_eq!(escape("a < b && \"c\""), "a &lt; b &amp;&amp; &quot;c&quot;");
        assert_eq!(escape("bell\u{7}tab\t"), "belltab\t");
    }

    #[test]
    fn test_run_props_and_breaks() {
        let mut out = String::new();
        Run::new("a\nb").bold(true).color("666666").write_to(&mut out).unwrap();
        assert_eq!(
            out,
            r#"<w:r><w:rPr><w:b/><w:color w:val="666666"/></w:rPr><w:t xml:space="preserve">a</w:t><w:br/><w:t xml:space="preserve">b</w:t></w:r>"#
        );
    }

    #[test]
    fn test_plain_paragraph_has_no_props() {
        let mut out = String::new();
        Paragraph::new().run(Run::new("x")).write_to(&mut out).unwrap();
        assert_eq!(out, r#"<w:p><w:r><w:t xml:space="preserve">x</w:t></w:r></w:p>"#);
    }

    #[test]
    fn test_paragraph_prop_order() {
        let mut out = String::new();
        Paragraph::styled("Heading1")
            .page_break_before()
            .spacing(400, 200)
            .centered()
            .write_to(&mut out)
            .unwrap();
        let style = out.find("pStyle").unwrap();
        let brk = out.find("pageBreakBefore").unwrap();
        let spacing = out.find("w:spacing").unwrap();
        let jc = out.find("w:jc").unwrap();
        assert!(style < brk && brk < spacing && spacing < jc);
    }

    #[test]
    fn test_table_pads_rows_to_header_width() {
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows = vec![vec!["1".to_string()], vec!["1".into(), "2".into(), "3".into()]];
        let table = Table { headers: &headers, rows: &rows, width: 9360 };

        let mut out = String::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(out.matches("<w:tc>").count(), 6);
        assert_eq!(out.matches(r#"w:fill="E7E6E6""#).count(), 2);
        assert_eq!(out.matches(r#"<w:gridCol w:w="4680"/>"#).count(), 2);
    }

    #[test]
    fn test_headerless_table_uses_widest_row() {
        let rows = vec![vec!["x".to_string(), "y".into()], vec!["z".into()]];
        let table = Table { headers: &[], rows: &rows, width: 9000 };
        assert_eq!(table.columns(), 2);

        let mut out = String::new();
        table.write_to(&mut out).unwrap();
        assert!(!out.contains("tblHeader"));
        assert_eq!(out.matches("<w:tc>").count(), 4);
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let table = Table { headers: &[], rows: &[], width: 9360 };
        let mut out = String::new();
        table.write_to(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
