//! Error types for the synthesis pipeline

use thiserror::Error;

/// Errors surfaced by the synthesis pipeline
#[derive(Debug, Error)]
pub enum SopError {
    /// Validator was handed an empty text (caller contract violation)
    #[error("input text is empty")]
    EmptyInput,

    /// Upstream model endpoint answered with a non-success status
    #[error("upstream API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// Error payload delivered inside the upstream event stream
    #[error("upstream reported an error: {0}")]
    UpstreamReported(String),

    /// Upstream stream ended without producing any text
    #[error("upstream closed the stream before sending any text")]
    UpstreamClosed,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write document XML")]
    Xml(#[from] std::fmt::Error),

    /// Filename handed to the store is not a plain file name
    #[error("invalid artifact filename: {0}")]
    InvalidFilename(String),

    /// Request was cancelled before completion (client went away)
    #[error("request cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SopError>;
