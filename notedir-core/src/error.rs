//! Error types for the notedir ecosystem.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in notedir operations.
#[derive(Error, Debug)]
pub enum NoteDirError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Malformed event collection: {0}")]
    MalformedEvents(String),

    #[error("Directory lookup timed out after {}", humantime::format_duration(*.0))]
    LookupTimeout(Duration),

    #[error("Directory lookup found no match for {0}")]
    LookupNotFound(String),

    #[error("Directory lookup failed: {0}")]
    Lookup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<crate::people::LookupError> for NoteDirError {
    fn from(err: crate::people::LookupError) -> Self {
        use crate::people::LookupError;
        match err {
            LookupError::Timeout(after) => NoteDirError::LookupTimeout(after),
            LookupError::NotFound(email) => NoteDirError::LookupNotFound(email),
            LookupError::Failed(msg) => NoteDirError::Lookup(msg),
        }
    }
}

/// Result type alias for notedir operations.
pub type NoteDirResult<T> = Result<T, NoteDirError>;
