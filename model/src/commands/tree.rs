use talkbook_core::{Command, CommandError, CommandResult};

use crate::presentation::{AssetRef, Presentation};
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

/// Attaches a detached node (and its subtree) at a position.
#[derive(Debug)]
pub struct InsertNodeCommand {
    parent: NodeId,
    node: NodeId,
    index: usize,
}

impl InsertNodeCommand {
    pub fn new(parent: NodeId, node: NodeId, index: usize) -> Self {
        Self { parent, node, index }
    }
}

impl Command<Presentation> for InsertNodeCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        Ok(target.insert(self.parent, self.node, self.index)?)
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        target.remove_child(self.parent, self.node)?;
        Ok(())
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        target.tree().can_insert(self.parent, self.node, self.index)
    }

    fn description(&self) -> &str {
        "Insert node"
    }

    fn used_assets(&self, target: &Presentation) -> Vec<AssetRef> {
        target.subtree_assets(self.node)
    }
}

// ---------------------------------------------------------------------------
// Remove
// ---------------------------------------------------------------------------

/// Detaches a node from its parent. The subtree stays in the arena so undo
/// can put it back.
#[derive(Debug)]
pub struct RemoveNodeCommand {
    node: NodeId,
    /// Where the node was, captured on execute.
    position: Option<(NodeId, usize)>,
}

impl RemoveNodeCommand {
    pub fn new(node: NodeId) -> Self {
        Self { node, position: None }
    }
}

impl Command<Presentation> for RemoveNodeCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        self.position = Some(target.detach(self.node)?);
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        let (parent, index) = self
            .position
            .ok_or_else(|| CommandError::InvalidState("node was never removed".into()))?;
        Ok(target.insert(parent, self.node, index)?)
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        let tree = target.tree();
        match tree.parent(self.node) {
            Ok(Some(parent)) => tree.can_remove_child(parent, self.node),
            _ => false,
        }
    }

    fn description(&self) -> &str {
        "Remove node"
    }

    fn used_assets(&self, target: &Presentation) -> Vec<AssetRef> {
        target.subtree_assets(self.node)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Moves an attached node under a new parent.
///
/// `index` is the position among the new parent's children after the node
/// has been detached from its old place.
#[derive(Debug)]
pub struct MoveNodeCommand {
    node: NodeId,
    new_parent: NodeId,
    index: usize,
    old_position: Option<(NodeId, usize)>,
}

impl MoveNodeCommand {
    pub fn new(node: NodeId, new_parent: NodeId, index: usize) -> Self {
        Self {
            node,
            new_parent,
            index,
            old_position: None,
        }
    }
}

impl Command<Presentation> for MoveNodeCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        let (old_parent, old_index) = target.tree.detach(self.node)?;
        if let Err(err) = target.tree.insert(self.new_parent, self.node, self.index) {
            target.tree.insert(old_parent, self.node, old_index)?;
            // The node is back in place; the round trip is not a change.
            target.tree.drain_events();
            return Err(err.into());
        }
        self.old_position = Some((old_parent, old_index));
        target.flush();
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        let (old_parent, old_index) = self
            .old_position
            .ok_or_else(|| CommandError::InvalidState("node was never moved".into()))?;
        target.detach(self.node)?;
        Ok(target.insert(old_parent, self.node, old_index)?)
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        let tree = target.tree();
        tree.contains(self.new_parent)
            && self.node != self.new_parent
            && !tree.is_ancestor_of(self.node, self.new_parent)
            && matches!(tree.parent(self.node), Ok(Some(_)))
    }

    fn description(&self) -> &str {
        "Move node"
    }

    fn used_assets(&self, target: &Presentation) -> Vec<AssetRef> {
        target.subtree_assets(self.node)
    }
}
