//! The content tree.
//!
//! Nodes live in an arena owned by the [`Tree`] and are addressed by
//! [`NodeId`], which pairs the arena slot with the owning presentation so a
//! handle from one presentation is rejected by another. The parent link and
//! the child list are kept consistent by every mutator: a node is in exactly
//! one child list iff its parent is set, the tree has one root, and no node
//! is its own ancestor.
//!
//! Structural mutations run built-in precondition checks first, then the
//! optional [`TreeValidator`]. Nothing changes when either refuses.

mod validator;
mod visitor;

use std::fmt;

use talkbook_core::{Registry, Uid};

pub use validator::{MaxChildren, TreeValidator};
pub use visitor::{TreeVisitor, VisitFlow, VisitOutcome};

use crate::channel::{ChannelUid, ChannelsManager};
use crate::error::{Error, Result};
use crate::events::ChangeEvent;
use crate::media::Media;
use crate::presentation::PresentationId;
use crate::property::{ChannelsProperty, Property, PropertyKind, PropertySet, check_media};

pub type NodeUid = Uid<TreeNode>;

/// Handle to a node in a specific presentation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    presentation: PresentationId,
    uid: NodeUid,
}

impl NodeId {
    pub fn presentation(&self) -> PresentationId {
        self.presentation
    }

    pub fn uid(&self) -> NodeUid {
        self.uid
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.presentation, self.uid)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

/// One node: its parent link, ordered children and properties.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: PropertySet,
}

impl TreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }
}

/// A detached copy of a subtree's shape and properties.
///
/// Used to duplicate subtrees within a presentation and to move them across
/// presentations. Managed media references are copied as-is; the caller
/// decides whether to share or duplicate the underlying media data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeSnapshot {
    pub properties: PropertySet,
    pub children: Vec<SubtreeSnapshot>,
}

impl SubtreeSnapshot {
    /// Number of nodes in the snapshot.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SubtreeSnapshot::node_count).sum::<usize>()
    }

    /// Rewrites every node's property set in pre-order.
    pub fn try_for_each_properties(
        &mut self,
        f: &mut impl FnMut(&mut PropertySet) -> Result<()>,
    ) -> Result<()> {
        f(&mut self.properties)?;
        for child in &mut self.children {
            child.try_for_each_properties(f)?;
        }
        Ok(())
    }
}

/// Arena-backed content tree with a single root.
pub struct Tree {
    presentation: PresentationId,
    nodes: Registry<TreeNode>,
    root: NodeId,
    validator: Option<Box<dyn TreeValidator>>,
    pending: Vec<ChangeEvent>,
}

impl Tree {
    /// Creates a tree holding only its root.
    pub fn new(presentation: PresentationId) -> Self {
        let mut nodes = Registry::new();
        let uid = nodes.manage(Box::new(TreeNode::default()));
        Self {
            presentation,
            nodes,
            root: NodeId { presentation, uid },
            validator: None,
            pending: Vec::new(),
        }
    }

    pub fn presentation(&self) -> PresentationId {
        self.presentation
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Installs (or removes) the structural validator.
    pub fn set_validator(&mut self, validator: Option<Box<dyn TreeValidator>>) {
        self.validator = validator;
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Creates a detached node with no properties.
    pub fn create_node(&mut self) -> NodeId {
        let uid = self.nodes.manage(Box::new(TreeNode::default()));
        NodeId {
            presentation: self.presentation,
            uid,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.presentation == self.presentation && self.nodes.contains(id.uid)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node in the arena, attached or not.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let presentation = self.presentation;
        self.nodes.uids().map(move |uid| NodeId { presentation, uid })
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode> {
        if id.presentation != self.presentation {
            return Err(Error::CrossPresentation(id));
        }
        self.nodes.get(id.uid).ok_or(Error::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        if id.presentation != self.presentation {
            return Err(Error::CrossPresentation(id));
        }
        self.nodes.get_mut(id.uid).ok_or(Error::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn child_count(&self, id: NodeId) -> Result<usize> {
        Ok(self.node(id)?.children.len())
    }

    pub fn child(&self, parent: NodeId, index: usize) -> Result<NodeId> {
        let children = self.children(parent)?;
        children.get(index).copied().ok_or(Error::OutOfBounds {
            index,
            len: children.len(),
        })
    }

    /// Position of `child` in `parent`'s child list.
    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.node(child)?;
        self.children(parent)?
            .iter()
            .position(|c| *c == child)
            .ok_or(Error::NotAChild { parent, child })
    }

    /// Position of `node` among its siblings.
    pub fn index_in_parent(&self, node: NodeId) -> Result<usize> {
        let parent = self.parent(node)?.ok_or(Error::NodeLacksParent(node))?;
        self.index_of(parent, node)
    }

    /// True if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.node(node).ok().and_then(TreeNode::parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).ok().and_then(TreeNode::parent);
        }
        false
    }

    /// True if `node` is the root or hangs below it.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(node) && (node == self.root || self.is_ancestor_of(self.root, node))
    }

    /// Pre-order iterator over the strict descendants of `node`.
    pub fn descendants(&self, node: NodeId) -> Result<Descendants<'_>> {
        let mut stack = self.children(node)?.to_vec();
        stack.reverse();
        Ok(Descendants { tree: self, stack })
    }

    /// `node` followed by its descendants, pre-order.
    pub fn subtree(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let mut ids = vec![node];
        ids.extend(self.descendants(node)?);
        Ok(ids)
    }

    // --- Structural checks ---

    fn check_attach(&self, parent: NodeId, node: NodeId) -> Result<()> {
        self.node(parent)?;
        let entry = self.node(node)?;
        if node == self.root {
            return Err(Error::InvalidArgument("the root node cannot be attached".into()));
        }
        if entry.parent.is_some() {
            return Err(Error::NodeHasParent(node));
        }
        if node == parent || self.is_ancestor_of(node, parent) {
            return Err(Error::WouldCreateCycle { parent, node });
        }
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        self.check_attach(parent, node)?;
        let len = self.child_count(parent)?;
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(())
    }

    fn consult(&self, operation: &'static str, allowed: impl FnOnce(&dyn TreeValidator) -> bool) -> Result<()> {
        match &self.validator {
            Some(validator) if !allowed(validator.as_ref()) => Err(Error::ValidatorRefused(operation)),
            _ => Ok(()),
        }
    }

    fn plan_insert(&self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        self.check_insert(parent, node, index)?;
        self.consult("insert", |v| v.can_insert(self, parent, node, index))
    }

    fn plan_append(&self, parent: NodeId, node: NodeId) -> Result<usize> {
        let index = self.child_count(parent)?;
        self.check_insert(parent, node, index)?;
        self.consult("append_child", |v| v.can_append_child(self, parent, node))?;
        Ok(index)
    }

    fn plan_insert_beside(&self, anchor: NodeId, node: NodeId, after: bool) -> Result<(NodeId, usize)> {
        let parent = self.parent(anchor)?.ok_or(Error::NodeLacksParent(anchor))?;
        let index = self.index_of(parent, anchor)? + usize::from(after);
        self.check_insert(parent, node, index)?;
        if after {
            self.consult("insert_after", |v| v.can_insert_after(self, anchor, node))?;
        } else {
            self.consult("insert_before", |v| v.can_insert_before(self, anchor, node))?;
        }
        Ok((parent, index))
    }

    fn plan_remove(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        let index = self.index_of(parent, child)?;
        self.consult("remove_child", |v| v.can_remove_child(self, parent, child))?;
        Ok(index)
    }

    fn plan_replace(&self, parent: NodeId, new: NodeId, old: NodeId) -> Result<usize> {
        let index = self.index_of(parent, old)?;
        self.check_attach(parent, new)?;
        self.consult("replace_child", |v| v.can_replace_child(self, parent, new, old))?;
        Ok(index)
    }

    pub fn can_insert(&self, parent: NodeId, node: NodeId, index: usize) -> bool {
        self.plan_insert(parent, node, index).is_ok()
    }

    pub fn can_append_child(&self, parent: NodeId, node: NodeId) -> bool {
        self.plan_append(parent, node).is_ok()
    }

    pub fn can_insert_before(&self, anchor: NodeId, node: NodeId) -> bool {
        self.plan_insert_beside(anchor, node, false).is_ok()
    }

    pub fn can_insert_after(&self, anchor: NodeId, node: NodeId) -> bool {
        self.plan_insert_beside(anchor, node, true).is_ok()
    }

    pub fn can_remove_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.plan_remove(parent, child).is_ok()
    }

    pub fn can_replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        self.plan_replace(parent, new, old).is_ok()
    }

    // --- Structural mutations ---

    fn link(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        self.node_mut(parent)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        self.pending.push(ChangeEvent::ChildAdded {
            parent,
            child: node,
            index,
        });
        Ok(())
    }

    fn unlink(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let child = self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.pending.push(ChangeEvent::ChildRemoved { parent, child, index });
        Ok(child)
    }

    /// Inserts detached `node` at `index` in `parent`'s children.
    pub fn insert(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        self.plan_insert(parent, node, index)?;
        self.link(parent, node, index)
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        let index = self.plan_append(parent, node)?;
        self.link(parent, node, index)
    }

    /// Inserts detached `node` as the sibling just before `anchor`.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let (parent, index) = self.plan_insert_beside(anchor, node, false)?;
        self.link(parent, node, index)
    }

    /// Inserts detached `node` as the sibling just after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let (parent, index) = self.plan_insert_beside(anchor, node, true)?;
        self.link(parent, node, index)
    }

    /// Detaches `child` from `parent`. Returns its former index.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize> {
        let index = self.plan_remove(parent, child)?;
        self.unlink(parent, index)?;
        Ok(index)
    }

    /// Detaches and returns the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let child = self.child(parent, index)?;
        self.remove_child(parent, child)?;
        Ok(child)
    }

    /// Puts detached `new` where `old` was; `old` becomes detached.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<usize> {
        let index = self.plan_replace(parent, new, old)?;
        self.unlink(parent, index)?;
        self.link(parent, new, index)?;
        Ok(index)
    }

    /// Replaces the child at `index` with `new` and returns the old child.
    pub fn replace_child_at(&mut self, parent: NodeId, new: NodeId, index: usize) -> Result<NodeId> {
        let old = self.child(parent, index)?;
        self.replace_child(parent, new, old)?;
        Ok(old)
    }

    /// Detaches `node` from its parent. Returns the former parent and index.
    pub fn detach(&mut self, node: NodeId) -> Result<(NodeId, usize)> {
        let parent = self.parent(node)?.ok_or(Error::NodeLacksParent(node))?;
        let index = self.remove_child(parent, node)?;
        Ok((parent, index))
    }

    /// Frees a detached subtree's arena slots. Returns the number of nodes freed.
    ///
    /// Handles to the freed nodes become dangling and fail with
    /// [`Error::NodeNotFound`]; this includes handles held by history
    /// commands, whose undo will then fail.
    pub fn destroy_detached(&mut self, node: NodeId) -> Result<usize> {
        if node == self.root {
            return Err(Error::InvalidArgument("the root node cannot be destroyed".into()));
        }
        if self.parent(node)?.is_some() {
            return Err(Error::NodeHasParent(node));
        }
        let ids = self.subtree(node)?;
        for id in &ids {
            self.nodes
                .unmanage(id.uid)
                .map_err(|err| Error::registry("node", err))?;
        }
        log::debug!("destroyed {} detached node(s) under {node}", ids.len());
        Ok(ids.len())
    }

    // --- Properties ---

    pub fn properties(&self, node: NodeId) -> Result<&PropertySet> {
        Ok(&self.node(node)?.properties)
    }

    pub fn property(&self, node: NodeId, kind: PropertyKind) -> Result<Option<&Property>> {
        Ok(self.node(node)?.properties.get(kind))
    }

    pub fn channels_property(&self, node: NodeId) -> Result<Option<&ChannelsProperty>> {
        Ok(self.node(node)?.properties.channels())
    }

    /// Attaches `property`, returning the one of the same kind it replaced.
    pub fn add_property(&mut self, node: NodeId, property: Property) -> Result<Option<Property>> {
        let kind = property.kind();
        let replaced = self.node_mut(node)?.properties.insert(property);
        if replaced.is_some() {
            self.pending.push(ChangeEvent::PropertyRemoved { node, kind });
        }
        self.pending.push(ChangeEvent::PropertyAdded { node, kind });
        Ok(replaced)
    }

    pub fn remove_property(&mut self, node: NodeId, kind: PropertyKind) -> Result<Option<Property>> {
        let removed = self.node_mut(node)?.properties.remove(kind);
        if removed.is_some() {
            self.pending.push(ChangeEvent::PropertyRemoved { node, kind });
        }
        Ok(removed)
    }

    /// The media mapped on `channel` at `node`.
    pub fn media(&self, node: NodeId, channel: ChannelUid) -> Result<Option<&Media>> {
        Ok(self
            .channels_property(node)?
            .and_then(|property| property.media(channel)))
    }

    /// Maps `media` on `channel` at `node`, creating the node's channels
    /// property when it has none. Returns the previous mapping.
    pub fn set_media(
        &mut self,
        node: NodeId,
        channels: &ChannelsManager,
        channel: ChannelUid,
        media: Media,
    ) -> Result<Option<Media>> {
        self.node(node)?;
        check_media(channels, channel, &media)?;

        let entry = self.node_mut(node)?;
        let created = !entry.properties.contains(PropertyKind::Channels);
        if created {
            entry.properties.insert(ChannelsProperty::new().into());
        }
        let previous = match entry.properties.channels_mut() {
            Some(property) => property.set_media(channels, channel, media)?,
            None => return Err(Error::InvalidArgument("channels property missing".into())),
        };

        if created {
            self.pending.push(ChangeEvent::PropertyAdded {
                node,
                kind: PropertyKind::Channels,
            });
        }
        self.pending.push(ChangeEvent::MediaChanged { node, channel });
        Ok(previous)
    }

    /// Removes the mapping on `channel` at `node`.
    pub fn clear_media(&mut self, node: NodeId, channel: ChannelUid) -> Result<Option<Media>> {
        let removed = self
            .node_mut(node)?
            .properties
            .channels_mut()
            .and_then(|property| property.clear_media(channel));
        if removed.is_some() {
            self.pending.push(ChangeEvent::MediaChanged { node, channel });
        }
        Ok(removed)
    }

    /// Drops every mapping on `channel`, attached or not. Returns the nodes touched.
    pub(crate) fn clear_channel_everywhere(&mut self, channel: ChannelUid) -> Vec<NodeId> {
        let presentation = self.presentation;
        let mut touched = Vec::new();
        for (uid, entry) in self.nodes.iter_mut() {
            let cleared = entry
                .properties
                .channels_mut()
                .and_then(|property| property.clear_media(channel));
            if cleared.is_some() {
                touched.push(NodeId { presentation, uid });
            }
        }
        for node in &touched {
            self.pending.push(ChangeEvent::MediaChanged { node: *node, channel });
        }
        touched
    }

    // --- Copy ---

    pub fn snapshot(&self, node: NodeId) -> Result<SubtreeSnapshot> {
        let entry = self.node(node)?;
        let children = entry
            .children
            .iter()
            .map(|child| self.snapshot(*child))
            .collect::<Result<Vec<_>>>()?;
        Ok(SubtreeSnapshot {
            properties: entry.properties.clone(),
            children,
        })
    }

    /// Builds a detached subtree from `snapshot` and returns its top node.
    ///
    /// The new nodes are not attached anywhere, so no change events are raised.
    pub fn instantiate(&mut self, snapshot: SubtreeSnapshot) -> NodeId {
        let node = self.create_node();
        let SubtreeSnapshot { properties, children } = snapshot;
        let mut child_ids = Vec::with_capacity(children.len());
        for child in children {
            let child_id = self.instantiate(child);
            if let Some(entry) = self.nodes.get_mut(child_id.uid) {
                entry.parent = Some(node);
            }
            child_ids.push(child_id);
        }
        if let Some(entry) = self.nodes.get_mut(node.uid) {
            entry.properties = properties;
            entry.children = child_ids;
        }
        node
    }

    pub(crate) fn drain_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("presentation", &self.presentation)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("validator", &self.has_validator())
            .finish()
    }
}

/// Pre-order iterator returned by [`Tree::descendants`].
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        if let Ok(children) = self.tree.children(node) {
            self.stack.extend(children.iter().rev().copied());
        }
        Some(node)
    }
}
