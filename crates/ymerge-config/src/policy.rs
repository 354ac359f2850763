use ymerge_types::{
    AnchorConflictMode, AoHMergeMode, ArrayMergeMode, HashMergeMode, NodeCoord, NodeRef,
};

use crate::error::ConfigResult;

/// Source of merge modes for the merge engine.
///
/// The engine calls [`prepare`](Self::prepare) once per incoming document,
/// before any structural merging, and then queries modes by the coordinate of
/// the incoming node being merged.
pub trait MergePolicy {
    /// Compile any path-based rules against the incoming document.
    fn prepare(&mut self, incoming: &NodeRef) -> ConfigResult<()>;

    /// Mode for a mapping below the document root.
    fn hash_merge_mode(&self, coord: &NodeCoord) -> HashMergeMode;

    /// Mode for a sequence of scalars or sequences.
    fn array_merge_mode(&self, coord: &NodeCoord) -> ArrayMergeMode;

    /// Mode for a sequence of mappings.
    fn aoh_merge_mode(&self, coord: &NodeCoord) -> AoHMergeMode;

    /// Identity key for one record of an array-of-hashes deep merge.
    ///
    /// `coord` is the record's own coordinate. Returns `None` when no key can
    /// be determined (an empty record with no configured key).
    fn aoh_identity_key(&self, coord: &NodeCoord, record: &NodeRef) -> Option<String>;

    /// How to handle anchor name collisions.
    fn anchor_conflict_mode(&self) -> AnchorConflictMode;
}
