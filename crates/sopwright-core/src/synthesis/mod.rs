//! Response synthesis checks
//!
//! Progress detection while the model is still writing, the structural gate
//! once the full text is known, and title extraction for the artifact.

mod detector;
mod sections;
mod title;
mod validator;

pub use detector::{HeadingDetector, HeadingEvent, TAIL_WINDOW};
pub use sections::{HeadingSpec, REQUIRED_HEADINGS, SOP_SECTIONS};
pub use title::{extract_title, slug};
pub use validator::{validate, StructuralValidator, ValidationResult};
