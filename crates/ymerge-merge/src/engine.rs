//! The structural merge.
//!
//! Merging a pair of nodes either settles immediately on the node that should
//! occupy the merged position (usually the target, sometimes the incoming
//! node) or opens a frame that merges the target in place, entry by entry.
//! Frames live on an explicit stack so document depth never grows the call
//! stack; they are processed depth first, in document order. Policy lookups
//! use coordinates in the incoming document, which is where the rules were
//! compiled.

use std::rc::Rc;

use ymerge_config::MergePolicy;
use ymerge_path::escape_segment;
use ymerge_types::{
    nodes_equal, AoHMergeMode, ArrayMergeMode, HashMergeMode, Mapping, NodeCoord, NodeKind,
    NodeRef, ParentRef,
};

use crate::error::{MergeError, MergeResult};

pub(crate) struct DeepMerge<'a> {
    policy: &'a dyn MergePolicy,
}

/// Result of starting to merge one pair of nodes.
enum Outcome {
    /// The merged position holds this node; nothing is left to do.
    Settled(NodeRef),
    /// The target keeps its position and the frame merges into it.
    Descend(Frame),
}

enum Frame {
    Mapping(MappingFrame),
    Records(RecordsFrame),
}

/// A deep mapping merge in progress.
struct MappingFrame {
    target: NodeRef,
    incoming: NodeRef,
    entries: std::vec::IntoIter<(NodeRef, NodeRef)>,
    /// Incoming keys absent from the target, waiting for the next existing key.
    buffer: Vec<(NodeRef, NodeRef)>,
    path: String,
}

/// An array-of-hashes DEEP merge in progress.
struct RecordsFrame {
    target: NodeRef,
    incoming: NodeRef,
    records: std::iter::Enumerate<std::vec::IntoIter<NodeRef>>,
    path: String,
}

enum Step {
    Continue,
    Open(Frame),
    Finished,
}

impl<'a> DeepMerge<'a> {
    pub(crate) fn new(policy: &'a dyn MergePolicy) -> Self {
        Self { policy }
    }

    /// Merge a whole incoming document (or the subtree at a merge-at point)
    /// and return the node for the merged position. Mappings here are always
    /// merged deeply.
    pub(crate) fn merge_document(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        coord: &NodeCoord,
    ) -> MergeResult<NodeRef> {
        let frame = match self.begin(target, incoming, coord, "", true)? {
            Outcome::Settled(node) => return Ok(node),
            Outcome::Descend(frame) => frame,
        };

        let mut stack = vec![frame];
        while let Some(top) = stack.last_mut() {
            let step = match top {
                Frame::Mapping(frame) => self.step_mapping(frame)?,
                Frame::Records(frame) => self.step_records(frame)?,
            };
            match step {
                Step::Continue => {}
                Step::Open(frame) => stack.push(frame),
                Step::Finished => {
                    stack.pop();
                }
            }
        }
        Ok(Rc::clone(target))
    }

    /// Dispatch on the kinds of the two nodes.
    fn begin(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        coord: &NodeCoord,
        path: &str,
        is_root: bool,
    ) -> MergeResult<Outcome> {
        if Rc::ptr_eq(target, incoming) {
            return Ok(Outcome::Settled(Rc::clone(target)));
        }
        let target_kind = target.borrow().kind();
        let incoming_kind = incoming.borrow().kind();
        match (target_kind, incoming_kind) {
            (_, NodeKind::Scalar) => Ok(Outcome::Settled(Rc::clone(incoming))),
            (NodeKind::Mapping, NodeKind::Mapping) => {
                Ok(self.begin_mapping(target, incoming, coord, path, is_root))
            }
            (NodeKind::Sequence, NodeKind::Sequence) => {
                self.begin_sequence(target, incoming, coord, path)
            }
            (target_kind, incoming_kind) => {
                Err(MergeError::mismatch(path, target_kind, incoming_kind))
            }
        }
    }

    fn begin_mapping(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        coord: &NodeCoord,
        path: &str,
        is_root: bool,
    ) -> Outcome {
        if Rc::ptr_eq(target, incoming) {
            return Outcome::Settled(Rc::clone(target));
        }
        if !is_root {
            match self.policy.hash_merge_mode(coord) {
                HashMergeMode::Left => return Outcome::Settled(Rc::clone(target)),
                HashMergeMode::Right => return Outcome::Settled(Rc::clone(incoming)),
                HashMergeMode::Deep => {}
            }
        }
        Outcome::Descend(Frame::Mapping(MappingFrame {
            target: Rc::clone(target),
            incoming: Rc::clone(incoming),
            entries: mapping_entries(incoming).into_iter(),
            buffer: Vec::new(),
            path: path.to_string(),
        }))
    }

    /// Merge the next incoming entry of a mapping frame.
    fn step_mapping(&self, frame: &mut MappingFrame) -> MergeResult<Step> {
        let Some((key, value)) = frame.entries.next() else {
            if !frame.buffer.is_empty() {
                let mut node = frame.target.borrow_mut();
                if let Some(mapping) = node.value.as_mapping_mut() {
                    let end = mapping.len();
                    flush_buffer(mapping, end, &mut frame.buffer);
                }
            }
            return Ok(Step::Finished);
        };

        let path = format!("{}/{}", frame.path, escape_segment(&key.borrow().key_label()));
        tracing::debug!(path = %path, "merging key");

        let existing = {
            let target = frame.target.borrow();
            target.value.as_mapping().and_then(|m| m.position(&key))
        };
        let Some(mut index) = existing else {
            frame.buffer.push((key, value));
            return Ok(Step::Continue);
        };

        if !frame.buffer.is_empty() {
            let mut node = frame.target.borrow_mut();
            if let Some(mapping) = node.value.as_mapping_mut() {
                index += flush_buffer(mapping, index, &mut frame.buffer);
            }
        }

        let current = {
            let target = frame.target.borrow();
            target
                .value
                .as_mapping()
                .and_then(|m| m.entry(index).map(|(_, v)| Rc::clone(v)))
        };
        let Some(current) = current else {
            return Ok(Step::Continue);
        };
        let child = NodeCoord::child(
            Rc::clone(&value),
            Rc::clone(&frame.incoming),
            ParentRef::Key(Rc::clone(&key)),
        );
        match self.begin(&current, &value, &child, &path, false)? {
            Outcome::Settled(merged) => {
                if !Rc::ptr_eq(&merged, &current) {
                    if let Some(mapping) = frame.target.borrow_mut().value.as_mapping_mut() {
                        mapping.set_value_at(index, merged);
                    }
                }
                Ok(Step::Continue)
            }
            Outcome::Descend(next) => Ok(Step::Open(next)),
        }
    }

    /// Sequences are classified by their first incoming element.
    fn begin_sequence(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        coord: &NodeCoord,
        path: &str,
    ) -> MergeResult<Outcome> {
        let items = sequence_items(incoming);
        let Some(first) = items.first() else {
            return Ok(Outcome::Settled(Rc::clone(target)));
        };
        let first_kind = first.borrow().kind();
        if first_kind == NodeKind::Mapping {
            Ok(self.begin_aoh(target, incoming, items, coord, path))
        } else {
            Ok(Outcome::Settled(self.merge_simple(target, incoming, items, coord, path)))
        }
    }

    fn merge_simple(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        items: Vec<NodeRef>,
        coord: &NodeCoord,
        path: &str,
    ) -> NodeRef {
        let mode = self.policy.array_merge_mode(coord);
        match mode {
            ArrayMergeMode::Left => return Rc::clone(target),
            ArrayMergeMode::Right => return Rc::clone(incoming),
            ArrayMergeMode::Unique | ArrayMergeMode::All => {}
        }

        for (idx, item) in items.into_iter().enumerate() {
            tracing::debug!(path = %format!("{path}[{idx}]"), "merging element");
            if mode == ArrayMergeMode::All || !contains_equal(target, &item) {
                push_element(target, item);
            }
        }
        Rc::clone(target)
    }

    fn begin_aoh(
        &self,
        target: &NodeRef,
        incoming: &NodeRef,
        records: Vec<NodeRef>,
        coord: &NodeCoord,
        path: &str,
    ) -> Outcome {
        let mode = self.policy.aoh_merge_mode(coord);
        match mode {
            AoHMergeMode::Left => return Outcome::Settled(Rc::clone(target)),
            AoHMergeMode::Right => return Outcome::Settled(Rc::clone(incoming)),
            AoHMergeMode::Deep => {
                return Outcome::Descend(Frame::Records(RecordsFrame {
                    target: Rc::clone(target),
                    incoming: Rc::clone(incoming),
                    records: records.into_iter().enumerate(),
                    path: path.to_string(),
                }));
            }
            AoHMergeMode::Unique | AoHMergeMode::All => {}
        }

        for (idx, record) in records.into_iter().enumerate() {
            tracing::debug!(path = %format!("{path}[{idx}]"), mode = %mode, "merging record");
            if mode == AoHMergeMode::All || !contains_equal(target, &record) {
                push_element(target, record);
            }
        }
        Outcome::Settled(Rc::clone(target))
    }

    /// Deep-merge the next incoming record into the first target record with
    /// the same identity value, or append it.
    fn step_records(&self, frame: &mut RecordsFrame) -> MergeResult<Step> {
        let Some((idx, record)) = frame.records.next() else {
            return Ok(Step::Finished);
        };
        let path = format!("{}[{idx}]", frame.path);
        tracing::debug!(path = %path, mode = %AoHMergeMode::Deep, "merging record");

        let kind = record.borrow().kind();
        if kind != NodeKind::Mapping {
            return Err(MergeError::mismatch(&path, NodeKind::Mapping, kind));
        }
        let coord = NodeCoord::child(
            Rc::clone(&record),
            Rc::clone(&frame.incoming),
            ParentRef::Index(idx),
        );

        let Some(key) = self.policy.aoh_identity_key(&coord, &record) else {
            push_element(&frame.target, record);
            return Ok(Step::Continue);
        };
        let Some(identity) = value_under(&record, &key) else {
            return Err(MergeError::MissingIdentityKey { path, key });
        };

        let matched = {
            let target = frame.target.borrow();
            target.value.as_sequence().and_then(|items| {
                items.iter().enumerate().find_map(|(i, candidate)| {
                    value_under(candidate, &key)
                        .is_some_and(|v| nodes_equal(&v, &identity))
                        .then(|| (i, Rc::clone(candidate)))
                })
            })
        };

        let Some((index, current)) = matched else {
            push_element(&frame.target, record);
            return Ok(Step::Continue);
        };
        tracing::debug!(path = %path, key = %key, index, "matched record by identity");
        match self.begin_mapping(&current, &record, &coord, &path, false) {
            Outcome::Settled(merged) => {
                if !Rc::ptr_eq(&merged, &current) {
                    let mut node = frame.target.borrow_mut();
                    if let Some(slot) = node.value.as_sequence_mut().and_then(|items| items.get_mut(index)) {
                        *slot = merged;
                    }
                }
                Ok(Step::Continue)
            }
            Outcome::Descend(next) => Ok(Step::Open(next)),
        }
    }
}

/// Insert the buffered entries before `index`, in order. Returns how many
/// were inserted, which is how far the entry formerly at `index` moved.
pub(crate) fn flush_buffer(
    mapping: &mut Mapping,
    index: usize,
    buffer: &mut Vec<(NodeRef, NodeRef)>,
) -> usize {
    let count = buffer.len();
    for (offset, (key, value)) in buffer.drain(..).enumerate() {
        mapping.insert(index + offset, key, value);
    }
    count
}

fn mapping_entries(node: &NodeRef) -> Vec<(NodeRef, NodeRef)> {
    let node = node.borrow();
    let entries = node
        .value
        .as_mapping()
        .map(|m| m.iter().cloned().collect())
        .unwrap_or_default();
    entries
}

fn sequence_items(node: &NodeRef) -> Vec<NodeRef> {
    let node = node.borrow();
    let items = node.value.as_sequence().cloned().unwrap_or_default();
    items
}

/// The value stored under the scalar key `key` of a mapping node.
fn value_under(node: &NodeRef, key: &str) -> Option<NodeRef> {
    let node = node.borrow();
    let value = node.value.as_mapping().and_then(|m| m.get_str(key));
    value
}

fn contains_equal(sequence: &NodeRef, item: &NodeRef) -> bool {
    let sequence = sequence.borrow();
    let found = sequence
        .value
        .as_sequence()
        .is_some_and(|items| items.iter().any(|e| nodes_equal(e, item)));
    found
}

fn push_element(sequence: &NodeRef, item: NodeRef) {
    if let Some(items) = sequence.borrow_mut().value.as_sequence_mut() {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};
    use ymerge_config::{MergeDefaults, MergerConfig};
    use ymerge_types::{from_json, to_json, Node, Scalar, Value};

    fn merge_with(config: &mut MergerConfig, target: Json, incoming: Json) -> MergeResult<Json> {
        let target = from_json(&target);
        let incoming = from_json(&incoming);
        config.prepare(&incoming).unwrap();
        let merged = DeepMerge::new(&*config).merge_document(
            &target,
            &incoming,
            &NodeCoord::root(Rc::clone(&incoming)),
        )?;
        Ok(to_json(&merged))
    }

    fn merge(target: Json, incoming: Json) -> Json {
        merge_with(&mut MergerConfig::default(), target, incoming).unwrap()
    }

    fn with_defaults(f: impl FnOnce(&mut MergeDefaults)) -> MergerConfig {
        let mut config = MergerConfig::default();
        f(config.defaults_mut());
        config
    }

    fn keys(value: &Json) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    /// Take a tree apart one level at a time so dropping it stays shallow.
    fn dismantle(root: NodeRef) {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            let value = std::mem::replace(&mut node.borrow_mut().value, Value::Scalar(Scalar::Null));
            match value {
                Value::Sequence(items) => pending.extend(items),
                Value::Mapping(m) => {
                    for (k, v) in m.iter() {
                        pending.push(Rc::clone(k));
                        pending.push(Rc::clone(v));
                    }
                }
                Value::Scalar(_) => {}
            }
        }
    }

    #[test]
    fn flush_buffer_inserts_in_order_before_index() {
        let mut mapping = Mapping::new()
            .with_str("x", Node::scalar(1).into_ref())
            .with_str("m", Node::scalar(2).into_ref());
        let mut buffer = vec![
            (Node::scalar("n").into_ref(), Node::scalar(3).into_ref()),
            (Node::scalar("o").into_ref(), Node::scalar(4).into_ref()),
        ];
        assert_eq!(flush_buffer(&mut mapping, 1, &mut buffer), 2);
        assert!(buffer.is_empty());
        let labels: Vec<String> = mapping.keys().map(|k| k.borrow().key_label()).collect();
        assert_eq!(labels, vec!["x", "n", "o", "m"]);
    }

    #[test]
    fn buffered_keys_keep_anchor_definition_before_its_alias() {
        // incoming: {def: &x shared, use: *x}
        let shared = Node::scalar("shared").with_anchor("x").into_ref();
        let incoming = Node::mapping(
            Mapping::new()
                .with_str("def", Rc::clone(&shared))
                .with_str("use", Rc::clone(&shared)),
        )
        .into_ref();
        let target = from_json(&json!({"use": "old"}));
        let config = MergerConfig::default();
        DeepMerge::new(&config)
            .merge_document(&target, &incoming, &NodeCoord::root(Rc::clone(&incoming)))
            .unwrap();

        let node = target.borrow();
        let mapping = node.value.as_mapping().unwrap();
        let labels: Vec<String> = mapping.keys().map(|k| k.borrow().key_label()).collect();
        assert_eq!(labels, vec!["def", "use"]);
        assert!(Rc::ptr_eq(&mapping.get_str("def").unwrap(), &shared));
        assert!(Rc::ptr_eq(&mapping.get_str("use").unwrap(), &shared));
    }

    #[test]
    fn deep_hash_merge_overrides_and_adds() {
        let merged = merge(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
        assert_eq!(keys(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn new_keys_append_when_nothing_follows() {
        let merged = merge(json!({"z": 1}), json!({"a": 2, "b": 3}));
        assert_eq!(keys(&merged), vec!["z", "a", "b"]);
    }

    #[test]
    fn new_keys_land_before_the_next_existing_key() {
        let merged = merge(json!({"x": 1, "m": 2}), json!({"n": 3, "m": 4}));
        assert_eq!(keys(&merged), vec!["x", "n", "m"]);
        assert_eq!(merged["m"], json!(4));
    }

    #[test]
    fn nested_mappings_merge_deeply() {
        let merged = merge(
            json!({"hash": {"key1": "l1", "key2": "l2"}}),
            json!({"hash": {"key1": "r1", "key3": "r3"}}),
        );
        assert_eq!(merged, json!({"hash": {"key1": "r1", "key2": "l2", "key3": "r3"}}));
    }

    #[test]
    fn hash_left_and_right_below_root() {
        let mut config = with_defaults(|d| d.hashes = HashMergeMode::Left);
        let merged = merge_with(&mut config, json!({"h": {"a": 1}}), json!({"h": {"b": 2}})).unwrap();
        assert_eq!(merged, json!({"h": {"a": 1}}));

        let mut config = with_defaults(|d| d.hashes = HashMergeMode::Right);
        let merged = merge_with(&mut config, json!({"h": {"a": 1}}), json!({"h": {"b": 2}})).unwrap();
        assert_eq!(merged, json!({"h": {"b": 2}}));
    }

    #[test]
    fn root_is_always_deep() {
        let mut config = with_defaults(|d| d.hashes = HashMergeMode::Left);
        let merged = merge_with(&mut config, json!({"a": 1}), json!({"b": 2})).unwrap();
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn per_path_rule_overrides_default() {
        let mut config = MergerConfig::default();
        config.add_rule("/keep", "left").unwrap();
        let merged = merge_with(
            &mut config,
            json!({"keep": {"a": 1}, "deep": {"a": 1}}),
            json!({"keep": {"b": 2}, "deep": {"b": 2}}),
        )
        .unwrap();
        assert_eq!(merged, json!({"keep": {"a": 1}, "deep": {"a": 1, "b": 2}}));
    }

    #[test]
    fn empty_incoming_leaves_target_unchanged() {
        let target = json!({"a": [1, 2], "b": {"c": 3}});
        assert_eq!(merge(target.clone(), json!({})), target);
        assert_eq!(merge(target.clone(), json!({"a": [], "b": {}})), target);
        assert_eq!(merge(json!([1, 2]), json!([])), json!([1, 2]));
    }

    #[test]
    fn array_all_appends_everything() {
        assert_eq!(merge(json!({"l": [1, 2]}), json!({"l": [2, 3]})), json!({"l": [1, 2, 2, 3]}));
    }

    #[test]
    fn array_unique_drops_equal_elements() {
        let mut config = with_defaults(|d| d.arrays = ArrayMergeMode::Unique);
        let merged = merge_with(&mut config, json!({"l": [1, 2]}), json!({"l": [2, 3, 3]})).unwrap();
        assert_eq!(merged, json!({"l": [1, 2, 3]}));
    }

    #[test]
    fn array_unique_treats_equal_numbers_as_duplicates() {
        let mut config = with_defaults(|d| d.arrays = ArrayMergeMode::Unique);
        let merged =
            merge_with(&mut config, json!({"l": [1, 2]}), json!({"l": [1.0, 2.0, 2.5]})).unwrap();
        assert_eq!(merged, json!({"l": [1, 2, 2.5]}));
    }

    #[test]
    fn array_left_and_right() {
        let mut config = with_defaults(|d| d.arrays = ArrayMergeMode::Left);
        assert_eq!(
            merge_with(&mut config, json!({"l": [1]}), json!({"l": [2]})).unwrap(),
            json!({"l": [1]})
        );
        let mut config = with_defaults(|d| d.arrays = ArrayMergeMode::Right);
        assert_eq!(
            merge_with(&mut config, json!({"l": [1]}), json!({"l": [2]})).unwrap(),
            json!({"l": [2]})
        );
    }

    #[test]
    fn arrays_of_arrays_use_the_simple_rule() {
        let mut config = with_defaults(|d| d.arrays = ArrayMergeMode::Unique);
        let merged =
            merge_with(&mut config, json!([[1, 2], [3]]), json!([[3], [4]])).unwrap();
        assert_eq!(merged, json!([[1, 2], [3], [4]]));
    }

    #[test]
    fn aoh_deep_merges_by_identity_key() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Deep);
        config.add_key("/list", "id");
        let merged = merge_with(
            &mut config,
            json!({"list": [{"id": 1, "v": "x"}]}),
            json!({"list": [{"id": 1, "v": "y"}, {"id": 2, "v": "z"}]}),
        )
        .unwrap();
        assert_eq!(merged, json!({"list": [{"id": 1, "v": "y"}, {"id": 2, "v": "z"}]}));
    }

    #[test]
    fn aoh_deep_matches_numerically_equal_identities() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Deep);
        config.add_key("/list", "id");
        let merged = merge_with(
            &mut config,
            json!({"list": [{"id": 1, "v": "x"}]}),
            json!({"list": [{"id": 1.0, "w": "y"}]}),
        )
        .unwrap();
        assert_eq!(merged["list"].as_array().unwrap().len(), 1);
        assert_eq!(merged["list"][0]["v"], json!("x"));
        assert_eq!(merged["list"][0]["w"], json!("y"));
    }

    #[test]
    fn aoh_deep_defaults_to_first_key() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Deep);
        let merged = merge_with(
            &mut config,
            json!([{"name": "a", "n": 1}, {"name": "b", "n": 2}]),
            json!([{"name": "b", "n": 20, "extra": true}]),
        )
        .unwrap();
        assert_eq!(
            merged,
            json!([{"name": "a", "n": 1}, {"name": "b", "n": 20, "extra": true}])
        );
    }

    #[test]
    fn aoh_deep_missing_identity_key_fails() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Deep);
        config.add_key("/list", "id");
        let err = merge_with(&mut config, json!({"list": []}), json!({"list": [{"name": "x"}]}))
            .unwrap_err();
        assert!(
            matches!(err, MergeError::MissingIdentityKey { ref path, ref key } if path == "/list[0]" && key == "id")
        );
    }

    #[test]
    fn aoh_deep_rejects_non_mapping_records() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Deep);
        let err = merge_with(&mut config, json!([{"id": 1}]), json!([{"id": 2}, 5])).unwrap_err();
        assert!(matches!(
            err,
            MergeError::StructuralMismatch { ref path, target: NodeKind::Mapping, incoming: NodeKind::Scalar } if path == "[1]"
        ));
    }

    #[test]
    fn aoh_unique_and_all() {
        let target = json!([{"id": 1}]);
        let incoming = json!([{"id": 1}, {"id": 2}]);

        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Unique);
        assert_eq!(
            merge_with(&mut config, target.clone(), incoming.clone()).unwrap(),
            json!([{"id": 1}, {"id": 2}])
        );
        assert_eq!(merge(target, incoming), json!([{"id": 1}, {"id": 1}, {"id": 2}]));
    }

    #[test]
    fn aoh_left_and_right() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Left);
        assert_eq!(
            merge_with(&mut config, json!([{"a": 1}]), json!([{"b": 2}])).unwrap(),
            json!([{"a": 1}])
        );
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Right);
        assert_eq!(
            merge_with(&mut config, json!([{"a": 1}]), json!([{"b": 2}])).unwrap(),
            json!([{"b": 2}])
        );
    }

    #[test]
    fn scalar_overwrites_any_kind() {
        assert_eq!(merge(json!({"a": {"b": 1}}), json!({"a": 5})), json!({"a": 5}));
        assert_eq!(merge(json!({"a": [1]}), json!({"a": null})), json!({"a": null}));
    }

    #[test]
    fn compound_over_different_kind_is_mismatch() {
        let err = merge_with(&mut MergerConfig::default(), json!({"a": {"b": 1}}), json!({"a": [1]}))
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::StructuralMismatch { ref path, target: NodeKind::Mapping, incoming: NodeKind::Sequence } if path == "/a"
        ));

        let err = merge_with(&mut MergerConfig::default(), json!({"a": 1}), json!({"a": {"b": 1}}))
            .unwrap_err();
        assert!(matches!(err, MergeError::StructuralMismatch { .. }));
    }

    #[test]
    fn escaped_keys_in_error_paths() {
        let err = merge_with(&mut MergerConfig::default(), json!({"a/b": 1}), json!({"a/b": [1]}))
            .unwrap_err();
        assert!(matches!(err, MergeError::StructuralMismatch { ref path, .. } if path == "/a\\/b"));
    }

    #[test]
    fn aoh_unique_compares_records_numerically() {
        let mut config = with_defaults(|d| d.aoh = AoHMergeMode::Unique);
        let merged =
            merge_with(&mut config, json!([{"id": 1, "n": 2.0}]), json!([{"id": 1.0, "n": 2}]))
                .unwrap();
        assert_eq!(merged, json!([{"id": 1, "n": 2.0}]));
    }

    #[test]
    fn deeply_nested_documents_merge_without_recursion() {
        const DEPTH: usize = 5_000;
        let nest = |leaf: Json| {
            let mut node = from_json(&leaf);
            for _ in 0..DEPTH {
                node = Node::mapping(Mapping::new().with_str("k", node)).into_ref();
            }
            node
        };
        let target = nest(json!({"a": 1}));
        let incoming = nest(json!({"b": 2}));
        let config = MergerConfig::default();
        let merged = DeepMerge::new(&config)
            .merge_document(&target, &incoming, &NodeCoord::root(Rc::clone(&incoming)))
            .unwrap();
        assert!(Rc::ptr_eq(&merged, &target));

        let mut leaf = Rc::clone(&target);
        for _ in 0..DEPTH {
            let next = leaf.borrow().value.as_mapping().unwrap().get_str("k").unwrap();
            leaf = next;
        }
        assert_eq!(to_json(&leaf), json!({"a": 1, "b": 2}));

        drop(leaf);
        dismantle(merged);
        dismantle(target);
        dismantle(incoming);
    }

    #[test]
    fn identical_nodes_merge_as_noop() {
        let shared = from_json(&json!({"k": [1, 2]}));
        let target = Node::mapping(Mapping::new().with_str("s", Rc::clone(&shared))).into_ref();
        let incoming = Node::mapping(Mapping::new().with_str("s", Rc::clone(&shared))).into_ref();
        let config = MergerConfig::default();
        DeepMerge::new(&config)
            .merge_document(&target, &incoming, &NodeCoord::root(Rc::clone(&incoming)))
            .unwrap();
        assert_eq!(to_json(&target), json!({"s": {"k": [1, 2]}}));
    }
}
