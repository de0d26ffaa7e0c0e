//! Structural validation of a complete response

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use super::sections::{SectionMatcher, REQUIRED_HEADINGS};
use crate::error::{Result, SopError};

static DEFAULT_VALIDATOR: Lazy<StructuralValidator> = Lazy::new(|| {
    StructuralValidator::new(REQUIRED_HEADINGS).expect("required headings are escaped literals")
});

/// Presence of each required heading and the overall verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub details: BTreeMap<String, bool>,
}

/// All-or-nothing check against a fixed list of required headings
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    required: Vec<(String, SectionMatcher)>,
}

impl StructuralValidator {
    pub fn new(required: &[&str]) -> std::result::Result<Self, regex::Error> {
        let required = required
            .iter()
            .map(|name| SectionMatcher::complete_text(name).map(|m| (name.to_string(), m)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { required })
    }

    /// Validator for the standard required-heading list
    pub fn standard() -> Self {
        DEFAULT_VALIDATOR.clone()
    }

    pub fn validate(&self, text: &str) -> Result<ValidationResult> {
        if text.trim().is_empty() {
            return Err(SopError::EmptyInput);
        }

        let details: BTreeMap<String, bool> = self
            .required
            .iter()
            .map(|(name, matcher)| (name.clone(), matcher.is_match(text)))
            .collect();
        let is_valid = details.values().all(|present| *present);

        Ok(ValidationResult { is_valid, details })
    }
}

/// Validate against the standard SOP heading list
pub fn validate(text: &str) -> Result<ValidationResult> {
    DEFAULT_VALIDATOR.validate(text)
}
