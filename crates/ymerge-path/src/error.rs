//! Error types for path operations.

use thiserror::Error;

/// Errors that can occur while parsing or resolving a path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path text is malformed.
    #[error("invalid path {path:?}: {reason}")]
    Parse { path: String, reason: String },

    /// The path was required to match and did not.
    #[error("no node matches path {path:?}")]
    NotFound { path: String },
}

impl PathError {
    pub(crate) fn parse(path: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;
