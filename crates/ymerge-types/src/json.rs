//! Conversion between [`serde_json::Value`] and document nodes.
//!
//! JSON has no anchors or comments, so converted trees carry neither. Object
//! key order is kept as parsed.

use std::rc::Rc;

use serde_json::{Map, Number};

use crate::error::TypeError;
use crate::mapping::Mapping;
use crate::node::{Node, NodeRef, Scalar, Value};

/// Build a fresh node tree from a JSON value.
pub fn from_json(value: &serde_json::Value) -> NodeRef {
    let node = match value {
        serde_json::Value::Null => Node::null(),
        serde_json::Value::Bool(b) => Node::scalar(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Node::scalar(i),
            None => Node::scalar(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Node::scalar(s.as_str()),
        serde_json::Value::Array(items) => Node::sequence(items.iter().map(from_json).collect()),
        serde_json::Value::Object(obj) => {
            let mut mapping = Mapping::new();
            for (k, v) in obj {
                mapping.push(Node::scalar(k.as_str()).into_ref(), from_json(v));
            }
            Node::mapping(mapping)
        }
    };
    node.into_ref()
}

/// Parse JSON text into a node tree.
pub fn from_json_str(text: &str) -> Result<NodeRef, TypeError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| TypeError::InvalidJson(e.to_string()))?;
    Ok(from_json(&value))
}

/// Render a node tree as JSON.
///
/// Aliases are expanded into copies. Non-string keys use their label, and
/// non-finite floats become `null`.
pub fn to_json(node: &NodeRef) -> serde_json::Value {
    fold_tree(node, |node, children| match &node.value {
        Value::Scalar(s) => scalar_to_json(s),
        Value::Sequence(_) => serde_json::Value::Array(children),
        Value::Mapping(m) => {
            let mut obj = Map::new();
            // Children alternate key, value; keys render by label instead.
            let values = children.into_iter().skip(1).step_by(2);
            for ((k, _), value) in m.iter().zip(values) {
                obj.insert(k.borrow().key_label(), value);
            }
            serde_json::Value::Object(obj)
        }
    })
}

fn scalar_to_json(scalar: &Scalar) -> serde_json::Value {
    match scalar {
        Scalar::Null => serde_json::Value::Null,
        Scalar::Bool(b) => serde_json::Value::Bool(*b),
        Scalar::Int(i) => serde_json::Value::Number((*i).into()),
        Scalar::Float(x) => Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Scalar::String(s) => serde_json::Value::String(s.clone()),
    }
}

/// Deep copy of a tree, producing fresh identities for every node.
///
/// Anchors and comments are copied along with values.
pub fn deep_copy(node: &NodeRef) -> NodeRef {
    fold_tree(node, |src, children| {
        let value = match &src.value {
            Value::Scalar(s) => Value::Scalar(s.clone()),
            Value::Sequence(_) => Value::Sequence(children),
            Value::Mapping(_) => {
                let mut copy = Mapping::new();
                let mut children = children.into_iter();
                while let (Some(key), Some(value)) = (children.next(), children.next()) {
                    copy.push(key, value);
                }
                Value::Mapping(copy)
            }
        };
        Node {
            value,
            anchor: src.anchor.clone(),
            comment: src.comment.clone(),
        }
        .into_ref()
    })
}

struct FoldFrame<T> {
    node: NodeRef,
    children: std::vec::IntoIter<NodeRef>,
    done: Vec<T>,
}

impl<T> FoldFrame<T> {
    fn new(node: NodeRef) -> Self {
        let children = node.borrow().children();
        Self {
            done: Vec::with_capacity(children.len()),
            children: children.into_iter(),
            node,
        }
    }
}

/// Post-order fold over a tree using an explicit stack.
///
/// `combine` receives each node with the results for its children in
/// [`Node::children`] order. Shared nodes are folded once per occurrence.
fn fold_tree<T>(root: &NodeRef, mut combine: impl FnMut(&Node, Vec<T>) -> T) -> T {
    let mut stack: Vec<FoldFrame<T>> = Vec::new();
    let mut frame = FoldFrame::new(Rc::clone(root));
    loop {
        match frame.children.next() {
            Some(child) => {
                stack.push(frame);
                frame = FoldFrame::new(child);
            }
            None => {
                let value = combine(&frame.node.borrow(), frame.done);
                match stack.pop() {
                    Some(mut parent) => {
                        parent.done.push(value);
                        frame = parent;
                    }
                    None => return value,
                }
            }
        }
    }
}
