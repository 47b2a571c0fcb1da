//! Change notifications raised by a presentation.

use talkbook_core::{BusEvent, EventBus};

use crate::channel::ChannelUid;
use crate::data_provider::DataProviderUid;
use crate::media_data::MediaDataUid;
use crate::property::PropertyKind;
use crate::tree::NodeId;

/// The bus type a presentation publishes on.
pub type ChangeBus = EventBus<ChangeEvent>;

/// Routing discriminant of a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ChildAdded,
    ChildRemoved,
    PropertyAdded,
    PropertyRemoved,
    MediaChanged,
    ChannelAdded,
    ChannelRemoved,
    MediaDataAdded,
    MediaDataRemoved,
    DataProviderRemoved,
    CommandDone,
    CommandUndone,
    CommandRedone,
    TransactionStarted,
    TransactionEnded,
    TransactionCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    ChildAdded { parent: NodeId, child: NodeId, index: usize },
    ChildRemoved { parent: NodeId, child: NodeId, index: usize },
    PropertyAdded { node: NodeId, kind: PropertyKind },
    PropertyRemoved { node: NodeId, kind: PropertyKind },
    MediaChanged { node: NodeId, channel: ChannelUid },
    ChannelAdded { channel: ChannelUid },
    ChannelRemoved { channel: ChannelUid },
    MediaDataAdded { uid: MediaDataUid },
    MediaDataRemoved { uid: MediaDataUid },
    DataProviderRemoved { uid: DataProviderUid },
    CommandDone { description: String },
    CommandUndone { description: String },
    CommandRedone { description: String },
    TransactionStarted { description: String },
    /// `committed` is false when the transaction was empty and left no entry.
    TransactionEnded { committed: bool },
    TransactionCancelled,
}

impl BusEvent for ChangeEvent {
    type Kind = ChangeKind;
    type Source = NodeId;

    fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::ChildAdded { .. } => ChangeKind::ChildAdded,
            ChangeEvent::ChildRemoved { .. } => ChangeKind::ChildRemoved,
            ChangeEvent::PropertyAdded { .. } => ChangeKind::PropertyAdded,
            ChangeEvent::PropertyRemoved { .. } => ChangeKind::PropertyRemoved,
            ChangeEvent::MediaChanged { .. } => ChangeKind::MediaChanged,
            ChangeEvent::ChannelAdded { .. } => ChangeKind::ChannelAdded,
            ChangeEvent::ChannelRemoved { .. } => ChangeKind::ChannelRemoved,
            ChangeEvent::MediaDataAdded { .. } => ChangeKind::MediaDataAdded,
            ChangeEvent::MediaDataRemoved { .. } => ChangeKind::MediaDataRemoved,
            ChangeEvent::DataProviderRemoved { .. } => ChangeKind::DataProviderRemoved,
            ChangeEvent::CommandDone { .. } => ChangeKind::CommandDone,
            ChangeEvent::CommandUndone { .. } => ChangeKind::CommandUndone,
            ChangeEvent::CommandRedone { .. } => ChangeKind::CommandRedone,
            ChangeEvent::TransactionStarted { .. } => ChangeKind::TransactionStarted,
            ChangeEvent::TransactionEnded { .. } => ChangeKind::TransactionEnded,
            ChangeEvent::TransactionCancelled => ChangeKind::TransactionCancelled,
        }
    }

    /// Child events are scoped to the parent so a listener on a node hears
    /// about its own children changing.
    fn source(&self) -> Option<NodeId> {
        match self {
            ChangeEvent::ChildAdded { parent, .. } | ChangeEvent::ChildRemoved { parent, .. } => {
                Some(*parent)
            }
            ChangeEvent::PropertyAdded { node, .. }
            | ChangeEvent::PropertyRemoved { node, .. }
            | ChangeEvent::MediaChanged { node, .. } => Some(*node),
            _ => None,
        }
    }
}
