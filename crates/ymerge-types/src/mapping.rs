//! Insertion-ordered mapping with value-equality key lookup.
//!
//! Entry order is part of the document: it is preserved through merges and
//! new keys are placed by explicit index. Lookups compare keys by value, so a
//! key written in one document finds the equal key of another.

use std::rc::Rc;

use crate::node::{nodes_equal, Node, NodeRef};

/// An ordered list of `(key, value)` node pairs.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    entries: Vec<(NodeRef, NodeRef)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (NodeRef, NodeRef)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, (NodeRef, NodeRef)> {
        self.entries.iter_mut()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &NodeRef> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Position of the entry whose key is value-equal to `key`.
    pub fn position(&self, key: &NodeRef) -> Option<usize> {
        self.entries.iter().position(|(k, _)| nodes_equal(k, key))
    }

    /// Position of the entry whose scalar key renders as `label`.
    pub fn position_str(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| {
            let k = k.borrow();
            k.value.as_scalar().is_some_and(|s| s.to_string() == label)
        })
    }

    /// Value stored under a key equal to `key`.
    pub fn get(&self, key: &NodeRef) -> Option<NodeRef> {
        self.position(key).map(|i| Rc::clone(&self.entries[i].1))
    }

    /// Value stored under the scalar key rendering as `label`.
    pub fn get_str(&self, label: &str) -> Option<NodeRef> {
        self.position_str(label).map(|i| Rc::clone(&self.entries[i].1))
    }

    /// Entry at `index`.
    pub fn entry(&self, index: usize) -> Option<&(NodeRef, NodeRef)> {
        self.entries.get(index)
    }

    /// Append an entry without checking for an existing equal key.
    pub fn push(&mut self, key: NodeRef, value: NodeRef) {
        self.entries.push((key, value));
    }

    /// Insert an entry before `index` (or append when `index == len`).
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, key: NodeRef, value: NodeRef) {
        self.entries.insert(index, (key, value));
    }

    /// Set the value under `key`, keeping its position; append when absent.
    pub fn set(&mut self, key: NodeRef, value: NodeRef) {
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Replace the value at `index`. Out-of-range indices are ignored.
    pub fn set_value_at(&mut self, index: usize, value: NodeRef) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.1 = value;
        }
    }

    /// Remove and return the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Option<(NodeRef, NodeRef)> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Convenience for building string-keyed mappings.
    pub fn with_str(mut self, key: &str, value: NodeRef) -> Self {
        self.push(Node::scalar(key).into_ref(), value);
        self
    }
}

impl PartialEq for Mapping {
    /// Order-insensitive: same size, and every key maps to an equal value.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(k, v)| {
                other
                    .get(k)
                    .is_some_and(|ov| nodes_equal(v, &ov))
            })
    }
}
