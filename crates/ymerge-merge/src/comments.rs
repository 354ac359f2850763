//! Annotation removal.

use std::collections::HashSet;
use std::rc::Rc;

use ymerge_types::NodeRef;

/// Remove every comment from `node` and all of its descendants.
///
/// Aliased subtrees are visited once.
pub fn strip_comments(node: &NodeRef) {
    let mut stack = vec![Rc::clone(node)];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if !seen.insert(Rc::as_ptr(&current)) {
            continue;
        }
        let children = {
            let mut node = current.borrow_mut();
            node.comment = None;
            node.children()
        };
        stack.extend(children);
    }
}
