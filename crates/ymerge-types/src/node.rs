use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::mapping::Mapping;

/// Shared handle to a document node.
///
/// Every position in a document holds a `NodeRef`. Aliases of an anchored
/// node hold clones of the same handle, so a write through any alias is
/// visible at every other alias site. Identity is pointer identity
/// ([`Rc::ptr_eq`]); equality is value equality ([`nodes_equal`]).
pub type NodeRef = Rc<RefCell<Node>>;

/// A scalar leaf value.
///
/// Integers and floats compare numerically, so `1` equals `1.0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(i), Self::Float(x)) | (Self::Float(x), Self::Int(i)) => int_equals_float(*i, *x),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Exact comparison: the float must be integral and round-trip to `i`.
fn int_equals_float(i: i64, x: f64) -> bool {
    x.fract() == 0.0 && x == i as f64 && x as i64 == i
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// The shape of a node. Closed: there is no fourth kind.
#[derive(Clone, Debug)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<NodeRef>),
    Mapping(Mapping),
}

impl Value {
    /// The kind tag of this value.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Scalar(_) => NodeKind::Scalar,
            Self::Sequence(_) => NodeKind::Sequence,
            Self::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<NodeRef>> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }
}

/// Node kind tag, used for dispatch diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Sequence => write!(f, "sequence"),
            Self::Mapping => write!(f, "mapping"),
        }
    }
}

/// A document node: a value plus its optional anchor and annotation.
///
/// Equality (`==`) compares values only; anchors and comments are ignored.
#[derive(Clone, Debug)]
pub struct Node {
    pub value: Value,
    pub anchor: Option<String>,
    pub comment: Option<String>,
}

impl Node {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            anchor: None,
            comment: None,
        }
    }

    /// A scalar node.
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::new(Value::Scalar(value.into()))
    }

    /// The null scalar.
    pub fn null() -> Self {
        Self::new(Value::Scalar(Scalar::Null))
    }

    /// A sequence node over the given elements.
    pub fn sequence(items: Vec<NodeRef>) -> Self {
        Self::new(Value::Sequence(items))
    }

    /// A mapping node.
    pub fn mapping(mapping: Mapping) -> Self {
        Self::new(Value::Mapping(mapping))
    }

    /// Attach an anchor name.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Attach an annotation.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    /// The anchor name, if one is set and non-empty.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref().filter(|a| !a.is_empty())
    }

    /// Returns `true` if this node carries the given anchor.
    pub fn has_anchor(&self, name: &str) -> bool {
        self.anchor() == Some(name)
    }

    /// Direct children in document order: key then value for each mapping
    /// entry, or each sequence element. Scalars have none.
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.value {
            Value::Scalar(_) => Vec::new(),
            Value::Sequence(items) => items.clone(),
            Value::Mapping(m) => m
                .iter()
                .flat_map(|(k, v)| [Rc::clone(k), Rc::clone(v)])
                .collect(),
        }
    }

    /// Human-readable label used when this node is a mapping key in a path.
    pub fn key_label(&self) -> String {
        match &self.value {
            Value::Scalar(s) => s.to_string(),
            Value::Sequence(_) | Value::Mapping(_) => format!("<{}>", self.kind()),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = Vec::new();
        shallow_equal(self, other, &mut pending) && pending_equal(pending)
    }
}

/// Value equality between two handles.
///
/// Identical handles are equal without borrowing, so comparing a node with
/// an alias of itself is always safe. Deep trees are compared with an
/// explicit worklist rather than recursion.
pub fn nodes_equal(a: &NodeRef, b: &NodeRef) -> bool {
    pending_equal(vec![(Rc::clone(a), Rc::clone(b))])
}

fn pending_equal(mut pending: Vec<(NodeRef, NodeRef)>) -> bool {
    while let Some((a, b)) = pending.pop() {
        if Rc::ptr_eq(&a, &b) {
            continue;
        }
        if !shallow_equal(&a.borrow(), &b.borrow(), &mut pending) {
            return false;
        }
    }
    true
}

/// Compare the top level of two nodes, queueing child pairs that must also
/// be equal.
fn shallow_equal(a: &Node, b: &Node, pending: &mut Vec<(NodeRef, NodeRef)>) -> bool {
    match (&a.value, &b.value) {
        (Value::Scalar(x), Value::Scalar(y)) => x == y,
        (Value::Sequence(x), Value::Sequence(y)) => {
            if x.len() != y.len() {
                return false;
            }
            pending.extend(x.iter().zip(y).map(|(l, r)| (Rc::clone(l), Rc::clone(r))));
            true
        }
        (Value::Mapping(x), Value::Mapping(y)) => {
            if x.len() != y.len() {
                return false;
            }
            // Order-insensitive: every key must find an equal key on the other side.
            for (key, value) in x.iter() {
                match y.get(key) {
                    Some(other) => pending.push((Rc::clone(value), other)),
                    None => return false,
                }
            }
            true
        }
        _ => false,
    }
}
