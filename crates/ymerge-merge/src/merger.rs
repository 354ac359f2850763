//! The document-level orchestrator.

use std::rc::Rc;

use ymerge_config::{MergePolicy, MergerConfig};
use ymerge_path::{PathResolver, SlashPathResolver};
use ymerge_types::{NodeCoord, NodeRef, ParentRef};

use crate::comments::strip_comments;
use crate::conflict::resolve_anchor_conflicts;
use crate::engine::DeepMerge;
use crate::error::{MergeError, MergeResult};

/// Folds incoming documents into one accumulated document.
///
/// Each call to [`merge_with`](Self::merge_with) strips comments from the
/// incoming document, reconciles its anchors with the target, compiles the
/// policy against it, and then merges it structurally.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use ymerge_config::MergerConfig;
/// use ymerge_merge::Merger;
/// use ymerge_types::{from_json, to_json};
///
/// let mut merger = Merger::new(from_json(&json!({"a": 1, "b": 2})), MergerConfig::default());
/// merger.merge_with(from_json(&json!({"b": 3, "c": 4}))).unwrap();
/// assert_eq!(to_json(merger.data()), json!({"a": 1, "b": 3, "c": 4}));
/// ```
pub struct Merger<P: MergePolicy = MergerConfig> {
    data: NodeRef,
    policy: P,
    resolver: Box<dyn PathResolver>,
    merge_at: String,
    merged: usize,
}

impl<P: MergePolicy> Merger<P> {
    /// Start from the prime document.
    pub fn new(prime: NodeRef, policy: P) -> Self {
        Self {
            data: prime,
            policy,
            resolver: Box::new(SlashPathResolver::new()),
            merge_at: "/".to_string(),
            merged: 0,
        }
    }

    /// Use a different path language for anchor and merge-at lookups.
    pub fn with_resolver(mut self, resolver: Box<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Merge every incoming document into the node at `path` instead of the
    /// root.
    pub fn with_merge_at(mut self, path: impl Into<String>) -> Self {
        self.merge_at = path.into();
        self
    }

    /// The accumulated document.
    pub fn data(&self) -> &NodeRef {
        &self.data
    }

    pub fn into_data(self) -> NodeRef {
        self.data
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Number of documents merged so far.
    pub fn merged_count(&self) -> usize {
        self.merged
    }

    /// Fold `incoming` into the accumulated document.
    ///
    /// `incoming` is consumed: anchor resolution rewrites it, and parts of it
    /// may end up shared with the result.
    pub fn merge_with(&mut self, mut incoming: NodeRef) -> MergeResult<()> {
        strip_comments(&incoming);
        resolve_anchor_conflicts(
            &mut self.data,
            &mut incoming,
            self.policy.anchor_conflict_mode(),
            self.resolver.as_ref(),
        )?;
        self.policy.prepare(&incoming)?;

        let root = NodeCoord::root(Rc::clone(&incoming));
        let engine = DeepMerge::new(&self.policy);
        if self.merges_at_root() {
            self.data = engine.merge_document(&self.data, &incoming, &root)?;
        } else {
            let at = self.merge_point()?;
            let merged = engine.merge_document(&at.node, &incoming, &root)?;
            if !Rc::ptr_eq(&merged, &at.node) {
                write_back(&at, merged);
            }
        }

        self.merged += 1;
        tracing::info!(
            document = self.merged,
            merge_at = %self.merge_at,
            "merged document"
        );
        Ok(())
    }

    fn merges_at_root(&self) -> bool {
        matches!(self.merge_at.trim(), "" | "/")
    }

    /// The single node the merge-at path names in the target.
    fn merge_point(&self) -> MergeResult<NodeCoord> {
        let failure = || MergeError::LookupFailure {
            anchor: None,
            path: self.merge_at.clone(),
        };
        let mut coords = self.resolver.resolve(&self.data, &self.merge_at, true)?;
        if coords.len() != 1 {
            return Err(failure());
        }
        let coord = coords.remove(0);
        // An anchor segment can select a mapping key, which has no value slot.
        if let Some(ParentRef::Key(key)) = &coord.parent_ref {
            if Rc::ptr_eq(key, &coord.node) {
                return Err(failure());
            }
        }
        Ok(coord)
    }
}

/// Store `merged` where `at` sits in its parent.
fn write_back(at: &NodeCoord, merged: NodeRef) {
    let (Some(parent), Some(parent_ref)) = (&at.parent, &at.parent_ref) else {
        return;
    };
    let mut parent = parent.borrow_mut();
    match parent_ref {
        ParentRef::Key(key) => {
            if let Some(mapping) = parent.value.as_mapping_mut() {
                if let Some(index) = mapping.position(key) {
                    mapping.set_value_at(index, merged);
                }
            }
        }
        ParentRef::Index(index) => {
            if let Some(slot) = parent.value.as_sequence_mut().and_then(|items| items.get_mut(*index)) {
                *slot = merged;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ymerge_config::MergeDefaults;
    use ymerge_types::{
        from_json, to_json, AnchorConflictMode, ArrayMergeMode, Mapping, Node, Value,
    };

    fn merger(target: serde_json::Value) -> Merger {
        Merger::new(from_json(&target), MergerConfig::default())
    }

    fn with_anchors(mode: AnchorConflictMode, prime: NodeRef) -> Merger {
        Merger::new(
            prime,
            MergerConfig::new(MergeDefaults {
                anchors: mode,
                ..MergeDefaults::default()
            }),
        )
    }

    fn node_at(doc: &NodeRef, path: &str) -> NodeRef {
        Rc::clone(&SlashPathResolver.resolve(doc, path, true).unwrap()[0].node)
    }

    /// `{aliases: [&anchor value], use: *anchor}`
    fn anchored_doc(anchor: &str, value: &str) -> (NodeRef, NodeRef) {
        let node = Node::scalar(value).with_anchor(anchor).into_ref();
        let doc = Node::mapping(
            Mapping::new()
                .with_str("aliases", Node::sequence(vec![Rc::clone(&node)]).into_ref())
                .with_str("use", Rc::clone(&node)),
        )
        .into_ref();
        (doc, node)
    }

    #[test]
    fn folds_several_documents_in_order() {
        let mut m = merger(json!({"a": 1}));
        m.merge_with(from_json(&json!({"b": 2}))).unwrap();
        m.merge_with(from_json(&json!({"a": 3, "l": [1]}))).unwrap();
        m.merge_with(from_json(&json!({"l": [2]}))).unwrap();
        assert_eq!(m.merged_count(), 3);
        assert_eq!(to_json(&m.into_data()), json!({"a": 3, "b": 2, "l": [1, 2]}));
    }

    #[test]
    fn incoming_comments_are_dropped() {
        let mut m = merger(json!({"a": 1}));
        let noted = Node::scalar("v").with_comment("# why").into_ref();
        let incoming = Node::mapping(Mapping::new().with_str("b", Rc::clone(&noted)))
            .with_comment("# header")
            .into_ref();
        m.merge_with(incoming).unwrap();
        let b = node_at(m.data(), "/b");
        assert!(b.borrow().comment.is_none());
        assert!(Rc::ptr_eq(&b, &noted));
    }

    #[test]
    fn sequence_roots_merge() {
        let mut m = merger(json!([1, 2]));
        m.merge_with(from_json(&json!([3]))).unwrap();
        assert_eq!(to_json(m.data()), json!([1, 2, 3]));
    }

    #[test]
    fn scalar_incoming_root_replaces_target() {
        let mut m = merger(json!({"a": 1}));
        m.merge_with(from_json(&json!("flat"))).unwrap();
        assert_eq!(to_json(m.data()), json!("flat"));
    }

    #[test]
    fn root_kind_mismatch_fails() {
        let mut m = merger(json!({"a": 1}));
        let err = m.merge_with(from_json(&json!([1]))).unwrap_err();
        assert!(matches!(err, MergeError::StructuralMismatch { ref path, .. } if path == "/"));
    }

    #[test]
    fn anchor_stop_fails_before_target_changes() {
        let (prime, prime_node) = anchored_doc("shared", "left");
        let mut m = with_anchors(AnchorConflictMode::Stop, prime);
        let (incoming, _) = anchored_doc("shared", "right");
        let mut incoming_map = incoming.borrow().value.as_mapping().cloned().unwrap();
        incoming_map.push(Node::scalar("extra").into_ref(), Node::scalar(1).into_ref());
        let incoming = Node::mapping(incoming_map).into_ref();

        let err = m.merge_with(incoming).unwrap_err();
        assert!(matches!(err, MergeError::AnchorConflict { ref anchor, .. } if anchor == "shared"));
        assert_eq!(
            to_json(m.data()),
            json!({"aliases": ["left"], "use": "left"})
        );
        assert!(Rc::ptr_eq(&node_at(m.data(), "/use"), &prime_node));
    }

    #[test]
    fn anchor_rename_keeps_both_values_under_distinct_names() {
        let (prime, prime_node) = anchored_doc("shared", "left");
        let mut m = with_anchors(AnchorConflictMode::Rename, prime);
        let (incoming, incoming_node) = anchored_doc("shared", "right");
        m.merge_with(incoming).unwrap();

        // `use` is overwritten by the incoming alias; `aliases` holds both.
        assert_eq!(
            to_json(m.data()),
            json!({"aliases": ["left", "right"], "use": "right"})
        );
        let left_name = prime_node.borrow().anchor().map(String::from).unwrap();
        let right_name = incoming_node.borrow().anchor().map(String::from).unwrap();
        assert_eq!(left_name, "shared");
        assert_ne!(left_name, right_name);
        assert!(Rc::ptr_eq(&node_at(m.data(), "/use"), &incoming_node));
    }

    #[test]
    fn anchor_keep_left_shares_the_target_node() {
        let (prime, prime_node) = anchored_doc("shared", "left");
        let mut m = with_anchors(AnchorConflictMode::Left, prime);
        let (incoming, _) = anchored_doc("shared", "right");
        m.merge_with(incoming).unwrap();
        assert_eq!(
            to_json(m.data()),
            json!({"aliases": ["left", "left"], "use": "left"})
        );
        assert!(Rc::ptr_eq(&node_at(m.data(), "/use"), &prime_node));
        assert!(Rc::ptr_eq(&node_at(m.data(), "/aliases[1]"), &prime_node));
    }

    #[test]
    fn anchor_keep_right_rewrites_target_aliases() {
        let (prime, _) = anchored_doc("shared", "left");
        let mut m = with_anchors(AnchorConflictMode::Right, prime);
        let (incoming, incoming_node) = anchored_doc("shared", "right");
        m.merge_with(incoming).unwrap();
        assert!(Rc::ptr_eq(&node_at(m.data(), "/aliases[0]"), &incoming_node));
        assert!(Rc::ptr_eq(&node_at(m.data(), "/use"), &incoming_node));
    }

    #[test]
    fn unified_anchor_keeps_one_identity() {
        let (prime, prime_node) = anchored_doc("same", "value");
        let mut m = with_anchors(AnchorConflictMode::Stop, prime);
        let (incoming, _) = anchored_doc("same", "value");
        m.merge_with(incoming).unwrap();
        assert!(Rc::ptr_eq(&node_at(m.data(), "/aliases[1]"), &prime_node));
    }

    #[test]
    fn merge_at_targets_a_subtree() {
        let mut m = merger(json!({"top": 1, "nested": {"a": 1}})).with_merge_at("/nested");
        m.merge_with(from_json(&json!({"b": 2}))).unwrap();
        assert_eq!(to_json(m.data()), json!({"top": 1, "nested": {"a": 1, "b": 2}}));
    }

    #[test]
    fn merge_at_writes_back_replaced_values() {
        let mut m = merger(json!({"list": [{"x": 1}, "old"]})).with_merge_at("/list[1]");
        m.merge_with(from_json(&json!("new"))).unwrap();
        assert_eq!(to_json(m.data()), json!({"list": [{"x": 1}, "new"]}));

        let mut m = merger(json!({"k": "old"})).with_merge_at("/k");
        m.merge_with(from_json(&json!("new"))).unwrap();
        assert_eq!(to_json(m.data()), json!({"k": "new"}));
    }

    #[test]
    fn merge_at_is_deep_even_when_hashes_default_left() {
        let config = MergerConfig::new(MergeDefaults {
            hashes: ymerge_types::HashMergeMode::Left,
            ..MergeDefaults::default()
        });
        let mut m = Merger::new(from_json(&json!({"n": {"a": 1}})), config).with_merge_at("/n");
        m.merge_with(from_json(&json!({"b": 2}))).unwrap();
        assert_eq!(to_json(m.data()), json!({"n": {"a": 1, "b": 2}}));
    }

    #[test]
    fn merge_at_missing_path_is_an_error() {
        let mut m = merger(json!({"a": 1})).with_merge_at("/nope");
        assert!(m.merge_with(from_json(&json!({"b": 2}))).is_err());

        let mut m = merger(json!({"a": 1})).with_merge_at("/a[x");
        assert!(matches!(
            m.merge_with(from_json(&json!({"b": 2}))),
            Err(MergeError::Path(_))
        ));
    }

    #[test]
    fn merge_at_must_name_one_node() {
        let shared = Node::mapping(Mapping::new()).with_anchor("s").into_ref();
        let prime = Node::mapping(
            Mapping::new()
                .with_str("one", Rc::clone(&shared))
                .with_str("two", Rc::clone(&shared)),
        )
        .into_ref();
        let mut m = Merger::new(prime, MergerConfig::default()).with_merge_at("/&s");
        let err = m.merge_with(from_json(&json!({"b": 2}))).unwrap_err();
        assert!(matches!(err, MergeError::LookupFailure { anchor: None, ref path } if path == "/&s"));
    }

    #[test]
    fn policy_rules_follow_each_document() {
        let mut config = MergerConfig::default();
        config.defaults_mut().arrays = ArrayMergeMode::Unique;
        config.add_rule("/all", "all").unwrap();
        let mut m = Merger::new(from_json(&json!({"all": [1], "uniq": [1]})), config);
        m.merge_with(from_json(&json!({"all": [1], "uniq": [1, 2]}))).unwrap();
        assert_eq!(to_json(m.data()), json!({"all": [1, 1], "uniq": [1, 2]}));
    }

    #[test]
    fn aliases_see_writes_through_any_site() {
        let shared = from_json(&json!({"k": 1})).borrow().clone().with_anchor("m").into_ref();
        let prime = Node::mapping(
            Mapping::new()
                .with_str("a", Rc::clone(&shared))
                .with_str("b", Rc::clone(&shared)),
        )
        .into_ref();
        let mut m = Merger::new(prime, MergerConfig::default());
        m.merge_with(from_json(&json!({"a": {"extra": true}}))).unwrap();
        assert_eq!(
            to_json(m.data()),
            json!({"a": {"k": 1, "extra": true}, "b": {"k": 1, "extra": true}})
        );
        assert!(matches!(shared.borrow().value, Value::Mapping(ref map) if map.len() == 2));
    }
}
