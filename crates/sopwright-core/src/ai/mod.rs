//! Upstream language model access

pub mod client;
pub mod prompt;
pub mod sse;

pub use client::{ClientConfig, UpstreamClient};
pub use prompt::{rewrite_query, sop_prompt, TABLE_ANALYSIS_PROMPT};
