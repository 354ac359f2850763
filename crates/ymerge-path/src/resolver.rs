//! The [`PathResolver`] trait and the built-in [`SlashPathResolver`].

use std::rc::Rc;

use ymerge_types::{NodeCoord, NodeRef, ParentRef, Value};

use crate::error::{PathError, Result};
use crate::segment::{DocPath, PathSegment};

/// Resolves path expressions against a document.
///
/// The merge core only depends on this trait; callers can plug in a richer
/// path language without touching the engine.
pub trait PathResolver {
    /// Every coordinate in `document` matched by `path`.
    ///
    /// With `must_exist`, an empty match is an error; otherwise it is
    /// `Ok(vec![])`. Malformed paths are always an error.
    fn resolve(&self, document: &NodeRef, path: &str, must_exist: bool) -> Result<Vec<NodeCoord>>;
}

/// Resolver for the slash-separated syntax described in the crate docs.
///
/// Anchor segments in a mapping match keys before values: a key carrying the
/// anchor yields the key node itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlashPathResolver;

impl SlashPathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve an already parsed path.
    pub fn resolve_path(&self, document: &NodeRef, path: &DocPath) -> Vec<NodeCoord> {
        let mut current = vec![NodeCoord::root(Rc::clone(document))];
        for segment in path.segments() {
            let mut next = Vec::new();
            for coord in &current {
                step(&coord.node, segment, &mut next);
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }
}

impl PathResolver for SlashPathResolver {
    fn resolve(&self, document: &NodeRef, path: &str, must_exist: bool) -> Result<Vec<NodeCoord>> {
        let parsed: DocPath = path.parse()?;
        let matches = self.resolve_path(document, &parsed);
        tracing::debug!(path = %parsed, matches = matches.len(), "resolved path");
        if must_exist && matches.is_empty() {
            return Err(PathError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(matches)
    }
}

fn step(parent: &NodeRef, segment: &PathSegment, out: &mut Vec<NodeCoord>) {
    let node = parent.borrow();
    match (&node.value, segment) {
        (Value::Mapping(m), PathSegment::Key(label)) => {
            for (k, v) in m.iter() {
                let matched = k
                    .borrow()
                    .value
                    .as_scalar()
                    .is_some_and(|s| s.to_string() == *label);
                if matched {
                    out.push(NodeCoord::child(
                        Rc::clone(v),
                        Rc::clone(parent),
                        ParentRef::Key(Rc::clone(k)),
                    ));
                }
            }
        }
        (Value::Mapping(m), PathSegment::Anchor(name)) => {
            for (k, v) in m.iter() {
                let hit = if k.borrow().has_anchor(name) {
                    Some(k)
                } else if v.borrow().has_anchor(name) {
                    Some(v)
                } else {
                    None
                };
                if let Some(hit) = hit {
                    out.push(NodeCoord::child(
                        Rc::clone(hit),
                        Rc::clone(parent),
                        ParentRef::Key(Rc::clone(k)),
                    ));
                }
            }
        }
        (Value::Sequence(items), PathSegment::Index(i)) => {
            if let Some(item) = items.get(*i) {
                out.push(NodeCoord::child(
                    Rc::clone(item),
                    Rc::clone(parent),
                    ParentRef::Index(*i),
                ));
            }
        }
        (Value::Sequence(items), PathSegment::Anchor(name)) => {
            for (i, item) in items.iter().enumerate() {
                if item.borrow().has_anchor(name) {
                    out.push(NodeCoord::child(
                        Rc::clone(item),
                        Rc::clone(parent),
                        ParentRef::Index(i),
                    ));
                }
            }
        }
        _ => {}
    }
}
