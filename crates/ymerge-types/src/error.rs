use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown {kind} merge mode: {value:?}")]
    UnknownMode { kind: &'static str, value: String },

    #[error("invalid JSON document: {0}")]
    InvalidJson(String),
}
