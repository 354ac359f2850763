//! Error types for the merge crate.

use ymerge_config::ConfigError;
use ymerge_path::PathError;
use ymerge_types::NodeKind;

/// Errors that abort a merge.
///
/// A merger that returned an error may hold a partially merged document and
/// should be discarded.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Both documents define an anchor under the same name with different
    /// values, and the policy says to stop.
    #[error("anchor conflict on &{anchor}: {reason}")]
    AnchorConflict { anchor: String, reason: String },

    /// A node that had to exist could not be located.
    #[error("lookup failed at {path}{}", anchor_suffix(.anchor))]
    LookupFailure {
        anchor: Option<String>,
        path: String,
    },

    /// Incoming data of one kind met target data of an incompatible kind.
    #[error("cannot merge a {incoming} into a {target} at {path}")]
    StructuralMismatch {
        path: String,
        target: NodeKind,
        incoming: NodeKind,
    },

    /// An array-of-hashes record has no value under its identity key.
    #[error("record at {path} has no identity key {key:?}")]
    MissingIdentityKey { path: String, key: String },

    /// Path parsing or resolution failed.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Policy compilation failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

fn anchor_suffix(anchor: &Option<String>) -> String {
    match anchor {
        Some(name) => format!(" (anchor &{name})"),
        None => String::new(),
    }
}

impl MergeError {
    pub(crate) fn anchor_lookup(anchor: &str, path: impl Into<String>) -> Self {
        Self::LookupFailure {
            anchor: Some(anchor.to_string()),
            path: path.into(),
        }
    }

    pub(crate) fn mismatch(path: &str, target: NodeKind, incoming: NodeKind) -> Self {
        Self::StructuralMismatch {
            path: display_path(path),
            target,
            incoming,
        }
    }
}

/// Render an engine path, where the root is the empty string.
pub(crate) fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
