//! Document model and markdown-subset parsing
//!
//! Turns model output into an ordered, flat sequence of [`Block`]s that the
//! renderer consumes.

mod blocks;
mod inline;
mod parser;

pub use blocks::{Block, TextRun};
pub use parser::{parse, BlockParser};
