//! Node coordinates: a node together with where it sits in its parent.
//!
//! Policy lookups are keyed by coordinate rather than by value, so two equal
//! subtrees at different positions can carry different merge rules.

use std::rc::Rc;

use crate::node::{nodes_equal, NodeRef};

/// How a node is reached from its parent.
#[derive(Clone, Debug)]
pub enum ParentRef {
    /// Value stored under this key of a parent mapping.
    Key(NodeRef),
    /// Element at this index of a parent sequence.
    Index(usize),
}

impl PartialEq for ParentRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Key(a), Self::Key(b)) => nodes_equal(a, b),
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

/// A `(node, parent, key-or-index)` triple.
#[derive(Clone, Debug)]
pub struct NodeCoord {
    pub node: NodeRef,
    pub parent: Option<NodeRef>,
    pub parent_ref: Option<ParentRef>,
}

impl NodeCoord {
    /// Coordinate of a document root.
    pub fn root(node: NodeRef) -> Self {
        Self {
            node,
            parent: None,
            parent_ref: None,
        }
    }

    /// Coordinate of a child reached from `parent` via `parent_ref`.
    pub fn child(node: NodeRef, parent: NodeRef, parent_ref: ParentRef) -> Self {
        Self {
            node,
            parent: Some(parent),
            parent_ref: Some(parent_ref),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if both coordinates denote the same position: the same
    /// node identity under the same parent identity, reached the same way.
    pub fn same_position(&self, other: &NodeCoord) -> bool {
        let same_parent = match (&self.parent, &other.parent) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        Rc::ptr_eq(&self.node, &other.node) && same_parent && self.parent_ref == other.parent_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn same_position_requires_identity() {
        let a = Node::scalar(1).into_ref();
        let b = Node::scalar(1).into_ref();
        assert!(NodeCoord::root(Rc::clone(&a)).same_position(&NodeCoord::root(Rc::clone(&a))));
        assert!(!NodeCoord::root(a).same_position(&NodeCoord::root(b)));
    }

    #[test]
    fn parent_ref_keys_compare_by_value() {
        let parent = Node::null().into_ref();
        let node = Node::scalar(1).into_ref();
        let x = NodeCoord::child(
            Rc::clone(&node),
            Rc::clone(&parent),
            ParentRef::Key(Node::scalar("k").into_ref()),
        );
        let y = NodeCoord::child(
            Rc::clone(&node),
            Rc::clone(&parent),
            ParentRef::Key(Node::scalar("k").into_ref()),
        );
        let z = NodeCoord::child(node, parent, ParentRef::Index(0));
        assert!(x.same_position(&y));
        assert!(!x.same_position(&z));
        assert!(!x.is_root());
    }
}
