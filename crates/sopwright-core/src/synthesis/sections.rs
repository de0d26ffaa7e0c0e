//! Section tables and heading matchers
//!
//! The progress label table and the required-heading list are plain data so
//! callers (and tests) can substitute their own.

use regex::{Regex, RegexBuilder};

/// A tracked section heading and the phrase shown while it is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingSpec {
    pub key: &'static str,
    pub label: &'static str,
}

impl HeadingSpec {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Sections of the SOP template, in the order the model is asked to write them
pub const SOP_SECTIONS: &[HeadingSpec] = &[
    HeadingSpec::new("Purpose", "Defining the purpose"),
    HeadingSpec::new("Scope", "Mapping scope and affected systems"),
    HeadingSpec::new("Responsibilities", "Assigning responsibilities"),
    HeadingSpec::new("Architecture Overview", "Sketching the architecture"),
    HeadingSpec::new("Prerequisites", "Listing prerequisites"),
    HeadingSpec::new("Dependencies", "Checking dependencies"),
    HeadingSpec::new("Data Model", "Designing the data model"),
    HeadingSpec::new("Procedure Steps", "Writing procedure steps"),
    HeadingSpec::new("Quality Checks", "Adding quality checks"),
    HeadingSpec::new("Rollback Plan", "Preparing the rollback plan"),
];

/// Headings a text must contain before a document is produced
pub const REQUIRED_HEADINGS: &[&str] = &[
    "Purpose",
    "Scope",
    "Architecture Overview",
    "Procedure Steps",
];

/// Case-insensitive matcher for one section heading
#[derive(Debug, Clone)]
pub(crate) struct SectionMatcher {
    regex: Regex,
}

impl SectionMatcher {
    /// Matches `#+ key` at a line start, or a bare line equal to `key`
    pub(crate) fn complete_text(key: &str) -> Result<Self, regex::Error> {
        Self::build(&format!(
            r"^[ \t]*(?:#+[ \t]*{key}|{key}[ \t]*\r?$)",
            key = regex::escape(key)
        ))
    }

    /// Like [`SectionMatcher::complete_text`], but a bare line only counts
    /// once its line terminator has arrived, so a partially streamed line
    /// that merely starts with `key` does not match
    pub(crate) fn streaming(key: &str) -> Result<Self, regex::Error> {
        Self::build(&format!(
            r"^[ \t]*(?:#+[ \t]*{key}|{key}[ \t]*\r?\n)",
            key = regex::escape(key)
        ))
    }

    fn build(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()?;
        Ok(Self { regex })
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}
