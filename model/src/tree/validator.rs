//! Pluggable structural validation.
//!
//! A [`TreeValidator`] is consulted after the tree's built-in precondition
//! checks pass. Refusal surfaces as [`Error::ValidatorRefused`](crate::Error::ValidatorRefused).

use super::{NodeId, Tree};

/// Extra structural rules for a document type.
///
/// Every predicate defaults to allowing the operation. The positional
/// insert variants delegate to [`can_insert`](Self::can_insert) with the
/// resolved parent and index, so most validators only override that one.
pub trait TreeValidator: Send + Sync {
    fn can_insert(&self, _tree: &Tree, _parent: NodeId, _node: NodeId, _index: usize) -> bool {
        true
    }

    fn can_append_child(&self, tree: &Tree, parent: NodeId, node: NodeId) -> bool {
        let index = tree.child_count(parent).unwrap_or(0);
        self.can_insert(tree, parent, node, index)
    }

    fn can_insert_before(&self, tree: &Tree, anchor: NodeId, node: NodeId) -> bool {
        match (tree.parent(anchor), tree.index_in_parent(anchor)) {
            (Ok(Some(parent)), Ok(index)) => self.can_insert(tree, parent, node, index),
            _ => false,
        }
    }

    fn can_insert_after(&self, tree: &Tree, anchor: NodeId, node: NodeId) -> bool {
        match (tree.parent(anchor), tree.index_in_parent(anchor)) {
            (Ok(Some(parent)), Ok(index)) => self.can_insert(tree, parent, node, index + 1),
            _ => false,
        }
    }

    fn can_remove_child(&self, _tree: &Tree, _parent: NodeId, _child: NodeId) -> bool {
        true
    }

    fn can_replace_child(&self, _tree: &Tree, _parent: NodeId, _new: NodeId, _old: NodeId) -> bool {
        true
    }
}

/// Caps the number of children any node may have.
#[derive(Debug, Clone, Copy)]
pub struct MaxChildren(pub usize);

impl TreeValidator for MaxChildren {
    fn can_insert(&self, tree: &Tree, parent: NodeId, _node: NodeId, _index: usize) -> bool {
        tree.child_count(parent).is_ok_and(|count| count < self.0)
    }
}
