//! Depth-first and breadth-first traversal.

use std::collections::VecDeque;

use super::{NodeId, Tree};
use crate::error::Result;

/// What a visitor wants after seeing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    /// Descend into the node's children.
    Continue,
    /// Do not descend below this node; siblings are still visited.
    SkipChildren,
    /// Stop the whole traversal. `post_visit` is not called for nodes still
    /// open on the path.
    Abort,
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Completed,
    Aborted,
}

/// Callbacks invoked by [`Tree::visit_depth_first`] and
/// [`Tree::visit_breadth_first`].
///
/// Closures `FnMut(&Tree, NodeId) -> VisitFlow` are visitors with a no-op
/// `post_visit`.
pub trait TreeVisitor {
    fn pre_visit(&mut self, tree: &Tree, node: NodeId) -> VisitFlow;

    fn post_visit(&mut self, _tree: &Tree, _node: NodeId) {}
}

impl<F: FnMut(&Tree, NodeId) -> VisitFlow> TreeVisitor for F {
    fn pre_visit(&mut self, tree: &Tree, node: NodeId) -> VisitFlow {
        self(tree, node)
    }
}

impl Tree {
    /// Pre-order/post-order walk of the subtree rooted at `start`.
    ///
    /// `post_visit` runs after all of a node's children are done, and also
    /// for nodes whose children were skipped.
    pub fn visit_depth_first<V: TreeVisitor + ?Sized>(
        &self,
        start: NodeId,
        visitor: &mut V,
    ) -> Result<VisitOutcome> {
        self.node(start)?;
        match visitor.pre_visit(self, start) {
            VisitFlow::Abort => return Ok(VisitOutcome::Aborted),
            VisitFlow::SkipChildren => {
                visitor.post_visit(self, start);
                return Ok(VisitOutcome::Completed);
            }
            VisitFlow::Continue => {}
        }

        // (node, index of the next child to visit)
        let mut stack = vec![(start, 0usize)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let children = self.children(node)?;
            if top.1 < children.len() {
                let child = children[top.1];
                top.1 += 1;
                match visitor.pre_visit(self, child) {
                    VisitFlow::Abort => return Ok(VisitOutcome::Aborted),
                    VisitFlow::SkipChildren => visitor.post_visit(self, child),
                    VisitFlow::Continue => stack.push((child, 0)),
                }
            } else {
                stack.pop();
                visitor.post_visit(self, node);
            }
        }
        Ok(VisitOutcome::Completed)
    }

    /// Level-order walk of the subtree rooted at `start`.
    ///
    /// `post_visit` runs right after a node's children have been queued,
    /// before any of them is visited.
    pub fn visit_breadth_first<V: TreeVisitor + ?Sized>(
        &self,
        start: NodeId,
        visitor: &mut V,
    ) -> Result<VisitOutcome> {
        self.node(start)?;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            match visitor.pre_visit(self, node) {
                VisitFlow::Abort => return Ok(VisitOutcome::Aborted),
                VisitFlow::Continue => queue.extend(self.children(node)?.iter().copied()),
                VisitFlow::SkipChildren => {}
            }
            visitor.post_visit(self, node);
        }
        Ok(VisitOutcome::Completed)
    }
}
