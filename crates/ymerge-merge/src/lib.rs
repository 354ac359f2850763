//! Merge engine for ymerge.
//!
//! Folds incoming documents into an accumulated target document. Each merge
//! runs in four steps:
//!
//! 1. **Comment stripping**: annotations on the incoming document are dropped
//! 2. **Anchor reconciliation**: anchors defined in both documents are unified
//!    when equal, otherwise renamed, overridden, or reported per
//!    [`AnchorConflictMode`](ymerge_types::AnchorConflictMode)
//! 3. **Policy compilation**: the [`MergePolicy`](ymerge_config::MergePolicy)
//!    resolves its per-path rules against the incoming document
//! 4. **Structural merge**: mappings, simple lists, and arrays-of-hashes are
//!    merged recursively, preserving key order
//!
//! [`Merger`] drives the steps; the anchor and comment helpers are exported
//! for callers that need them on their own.

pub mod anchors;
pub mod comments;
pub mod conflict;
mod engine;
pub mod error;
pub mod merger;


pub use anchors::{rename_anchor, replace_anchor, scan_anchors, search_for_anchor, AnchorMap};
pub use comments::strip_comments;
pub use conflict::{resolve_anchor_conflicts, unique_anchor_name};
pub use error::{MergeError, MergeResult};
pub use merger::Merger;
