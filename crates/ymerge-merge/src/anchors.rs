//! Anchor discovery and rewriting.
//!
//! Walks visit the root, then every mapping key and value and every sequence
//! element in document order. Shared subtrees are visited once.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use ymerge_path::escape_segment;
use ymerge_types::{Node, NodeRef, Value};

/// Identity of a node for visited sets.
pub(crate) type NodeId = *const RefCell<Node>;

/// Anchor names mapped to the node that carries them, in discovery order.
#[derive(Clone, Debug, Default)]
pub struct AnchorMap {
    entries: Vec<(String, NodeRef)>,
}

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The node recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&NodeRef> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeRef)> {
        self.entries.iter().map(|(n, node)| (n.as_str(), node))
    }

    /// Record `node` under `name` unless the name is already taken.
    /// Returns `true` if the entry was added.
    pub fn record(&mut self, name: &str, node: &NodeRef) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((name.to_string(), Rc::clone(node)));
        true
    }
}

/// Collect every anchored node of `doc`. The first node seen with a given
/// name wins.
pub fn scan_anchors(doc: &NodeRef) -> AnchorMap {
    scan_anchors_skipping(doc, &HashSet::new())
}

/// Like [`scan_anchors`], but nodes in `skip` and their subtrees are ignored.
pub(crate) fn scan_anchors_skipping(doc: &NodeRef, skip: &HashSet<NodeId>) -> AnchorMap {
    let mut anchors = AnchorMap::new();
    let mut stack = vec![Rc::clone(doc)];
    let mut seen: HashSet<NodeId> = HashSet::new();
    while let Some(current) = stack.pop() {
        let id = Rc::as_ptr(&current);
        if skip.contains(&id) || !seen.insert(id) {
            continue;
        }
        let children = {
            let node = current.borrow();
            if let Some(name) = node.anchor() {
                anchors.record(name, &current);
            }
            node.children()
        };
        stack.extend(children.into_iter().rev());
    }
    anchors
}

/// Every node identity reachable from `doc`.
pub(crate) fn node_ids(doc: &NodeRef) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack = vec![Rc::clone(doc)];
    while let Some(current) = stack.pop() {
        if seen.insert(Rc::as_ptr(&current)) {
            stack.extend(current.borrow().children());
        }
    }
    seen
}

/// Path to the first occurrence of `name` in `doc`.
///
/// A value or element is addressed by its key or index; an anchored key is
/// addressed as `/&name` within its mapping. The root itself is `/`.
pub fn search_for_anchor(doc: &NodeRef, name: &str) -> Option<String> {
    if doc.borrow().has_anchor(name) {
        return Some("/".to_string());
    }

    let mut stack = vec![(Rc::clone(doc), String::new())];
    let mut seen: HashSet<NodeId> = HashSet::new();
    while let Some((current, path)) = stack.pop() {
        if !seen.insert(Rc::as_ptr(&current)) {
            continue;
        }
        let mut next = Vec::new();
        {
            let node = current.borrow();
            match &node.value {
                Value::Scalar(_) => {}
                Value::Sequence(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let child = format!("{path}[{i}]");
                        if item.borrow().has_anchor(name) {
                            return Some(child);
                        }
                        next.push((Rc::clone(item), child));
                    }
                }
                Value::Mapping(m) => {
                    for (k, v) in m.iter() {
                        let key = k.borrow();
                        if key.has_anchor(name) {
                            return Some(format!("{path}/&{}", escape_segment(name)));
                        }
                        let child = format!("{path}/{}", escape_segment(&key.key_label()));
                        if v.borrow().has_anchor(name) {
                            return Some(child);
                        }
                        next.push((Rc::clone(v), child));
                    }
                }
            }
        }
        stack.extend(next.into_iter().rev());
    }
    None
}

/// Rename every occurrence of anchor `old` in `doc` to `new`, leaving nodes
/// listed in `skip` (and everything below them) untouched.
///
/// Returns the number of nodes renamed.
pub fn rename_anchor(doc: &NodeRef, old: &str, new: &str, skip: &HashSet<NodeId>) -> usize {
    let mut renamed = 0;
    let mut stack = vec![Rc::clone(doc)];
    let mut seen: HashSet<NodeId> = HashSet::new();
    while let Some(current) = stack.pop() {
        let id = Rc::as_ptr(&current);
        if skip.contains(&id) || !seen.insert(id) {
            continue;
        }
        let children = {
            let mut node = current.borrow_mut();
            if node.has_anchor(old) {
                node.anchor = Some(new.to_string());
                renamed += 1;
            }
            node.children()
        };
        stack.extend(children);
    }
    renamed
}

/// Replace every node anchored as `name` in `doc` with `replacement`.
///
/// Keys, values, elements, and the root itself are all candidates. The
/// replacement is not descended into. Returns the number of slots rewritten.
pub fn replace_anchor(doc: &mut NodeRef, name: &str, replacement: &NodeRef) -> usize {
    if Rc::ptr_eq(doc, replacement) {
        return 0;
    }
    if doc.borrow().has_anchor(name) {
        *doc = Rc::clone(replacement);
        return 1;
    }

    let mut replaced = 0;
    let mut stack = vec![Rc::clone(doc)];
    let mut seen: HashSet<NodeId> = HashSet::new();
    while let Some(current) = stack.pop() {
        if Rc::ptr_eq(&current, replacement) || !seen.insert(Rc::as_ptr(&current)) {
            continue;
        }
        let mut node = current.borrow_mut();
        match &mut node.value {
            Value::Scalar(_) => {}
            Value::Sequence(items) => {
                for slot in items.iter_mut() {
                    replaced += swap_slot(slot, name, replacement, &mut stack);
                }
            }
            Value::Mapping(m) => {
                for (key, value) in m.iter_mut() {
                    replaced += swap_slot(key, name, replacement, &mut stack);
                    replaced += swap_slot(value, name, replacement, &mut stack);
                }
            }
        }
    }
    replaced
}

fn swap_slot(slot: &mut NodeRef, name: &str, replacement: &NodeRef, stack: &mut Vec<NodeRef>) -> usize {
    if Rc::ptr_eq(slot, replacement) {
        return 0;
    }
    if slot.borrow().has_anchor(name) {
        *slot = Rc::clone(replacement);
        return 1;
    }
    stack.push(Rc::clone(slot));
    0
}
