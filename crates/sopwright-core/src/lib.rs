//! Sopwright core library
//!
//! Streams model output into a structured SOP document:
//! - `document`: markdown-subset parsing into blocks
//! - `synthesis`: heading progress detection, structural validation, titles
//! - `render`: DOCX rendering
//! - `store`: artifact storage
//! - `stream`: push events, heartbeat and the request orchestrator
//! - `ai`: upstream chat-completions client and prompts

pub mod ai;
pub mod config;
pub mod document;
pub mod error;
pub mod render;
pub mod store;
pub mod stream;
pub mod synthesis;

pub use config::Config;
pub use error::{Result, SopError};
pub use stream::{Orchestrator, PushEvent, PushSink, RequestCancellation};
