//! Anchor conflict detection and resolution.
//!
//! Runs before any structural merging. For each anchor name defined in both
//! documents the target and incoming nodes are compared; identical or
//! value-equal nodes are unified, anything else is a conflict handled by the
//! [`AnchorConflictMode`].

use std::collections::HashSet;
use std::rc::Rc;

use ymerge_path::PathResolver;
use ymerge_types::{nodes_equal, AnchorConflictMode, NodeRef};

use crate::anchors::{
    node_ids, rename_anchor, replace_anchor, scan_anchors, scan_anchors_skipping, search_for_anchor,
};
use crate::error::{MergeError, MergeResult};

/// Derive an anchor name absent from `taken` by appending `_` and the first
/// eight hex digits of the BLAKE3 hash of the current candidate, repeatedly.
///
/// ```
/// use std::collections::HashSet;
/// use ymerge_merge::unique_anchor_name;
///
/// let taken: HashSet<String> = ["base".to_string()].into_iter().collect();
/// let fresh = unique_anchor_name("base", &taken);
/// assert!(fresh.starts_with("base_"));
/// assert_eq!(fresh.len(), "base_".len() + 8);
/// assert_eq!(unique_anchor_name("other", &taken), "other");
/// ```
pub fn unique_anchor_name(anchor: &str, taken: &HashSet<String>) -> String {
    let mut candidate = anchor.to_string();
    while taken.contains(&candidate) {
        let digest = blake3::hash(candidate.as_bytes());
        candidate = format!("{candidate}_{}", &digest.to_hex().as_str()[..8]);
        tracing::debug!(anchor, candidate = %candidate, "trying anchor name");
    }
    candidate
}

/// Reconcile the anchors of `incoming` with those of `target`.
///
/// Under [`AnchorConflictMode::Stop`] every conflict is detected before
/// either document is modified.
pub fn resolve_anchor_conflicts(
    target: &mut NodeRef,
    incoming: &mut NodeRef,
    mode: AnchorConflictMode,
    resolver: &dyn PathResolver,
) -> MergeResult<()> {
    let left = scan_anchors(target);
    // Target subtrees already shared into the incoming document are not its own.
    let target_ids = node_ids(target);
    let right = scan_anchors_skipping(incoming, &target_ids);

    let mut unify = Vec::new();
    let mut conflicts = Vec::new();
    for (name, incoming_node) in right.iter() {
        let Some(target_node) = left.get(name) else {
            continue;
        };
        if Rc::ptr_eq(target_node, incoming_node) {
            continue;
        }
        if nodes_equal(target_node, incoming_node) {
            unify.push((name.to_string(), Rc::clone(target_node)));
        } else {
            conflicts.push(name.to_string());
        }
    }

    if mode == AnchorConflictMode::Stop {
        if let Some(anchor) = conflicts.first() {
            return Err(MergeError::AnchorConflict {
                anchor: anchor.clone(),
                reason: "both documents define it with different values".to_string(),
            });
        }
    }

    let mut taken: HashSet<String> = left.names().chain(right.names()).map(String::from).collect();
    for anchor in &conflicts {
        match mode {
            AnchorConflictMode::Rename => {
                let fresh = unique_anchor_name(anchor, &taken);
                taken.insert(fresh.clone());
                let renamed = rename_anchor(incoming, anchor, &fresh, &target_ids);
                tracing::debug!(anchor = %anchor, fresh = %fresh, renamed, "renamed incoming anchor");
            }
            AnchorConflictMode::Left => {
                let node = locate_anchor(target, anchor, resolver)?;
                let replaced = replace_anchor(incoming, anchor, &node);
                tracing::debug!(anchor = %anchor, replaced, "target anchor overrides incoming");
            }
            AnchorConflictMode::Right => {
                let node = locate_anchor(incoming, anchor, resolver)?;
                let replaced = replace_anchor(target, anchor, &node);
                tracing::debug!(anchor = %anchor, replaced, "incoming anchor overrides target");
            }
            AnchorConflictMode::Stop => {}
        }
    }

    for (anchor, node) in &unify {
        let replaced = replace_anchor(incoming, anchor, node);
        tracing::debug!(anchor = %anchor, replaced, "unified equal anchor");
    }
    Ok(())
}

/// One node carrying `anchor` in `doc`, found through the path resolver.
fn locate_anchor(doc: &NodeRef, anchor: &str, resolver: &dyn PathResolver) -> MergeResult<NodeRef> {
    let path = search_for_anchor(doc, anchor).ok_or_else(|| MergeError::anchor_lookup(anchor, "/"))?;
    let coords = resolver
        .resolve(doc, &path, true)
        .map_err(|_| MergeError::anchor_lookup(anchor, path.as_str()))?;
    coords
        .into_iter()
        .map(|coord| coord.node)
        .find(|node| node.borrow().has_anchor(anchor))
        .ok_or_else(|| MergeError::anchor_lookup(anchor, path))
}
