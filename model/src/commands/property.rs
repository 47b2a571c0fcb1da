use talkbook_core::{Command, CommandError, CommandResult};

use super::{media_assets, property_assets};
use crate::channel::ChannelUid;
use crate::media::Media;
use crate::presentation::{AssetRef, Presentation};
use crate::property::{Property, PropertyKind, check_media};
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Maps media on one channel of a node.
///
/// Undo restores the previous mapping, or clears the channel if there was
/// none. A channels property created by the edit is removed again on undo.
#[derive(Debug)]
pub struct SetMediaCommand {
    node: NodeId,
    channel: ChannelUid,
    media: Media,
    previous: Option<Media>,
    created_property: bool,
}

impl SetMediaCommand {
    pub fn new(node: NodeId, channel: ChannelUid, media: Media) -> Self {
        Self {
            node,
            channel,
            media,
            previous: None,
            created_property: false,
        }
    }
}

impl Command<Presentation> for SetMediaCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        self.created_property = !target
            .tree()
            .properties(self.node)?
            .contains(PropertyKind::Channels);
        self.previous = target.set_media(self.node, self.channel, self.media.clone())?;
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        match self.previous.clone() {
            Some(previous) => {
                target.set_media(self.node, self.channel, previous)?;
            }
            None => {
                target.clear_media(self.node, self.channel)?;
                if self.created_property {
                    target.remove_property(self.node, PropertyKind::Channels)?;
                }
            }
        }
        Ok(())
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        target.tree().contains(self.node)
            && check_media(target.channels(), self.channel, &self.media).is_ok()
    }

    fn description(&self) -> &str {
        "Set media"
    }

    fn used_assets(&self, _target: &Presentation) -> Vec<AssetRef> {
        media_assets(std::iter::once(&self.media).chain(self.previous.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// Attaches a property, replacing any property of the same kind.
#[derive(Debug)]
pub struct SetPropertyCommand {
    node: NodeId,
    property: Property,
    replaced: Option<Property>,
}

impl SetPropertyCommand {
    pub fn new(node: NodeId, property: impl Into<Property>) -> Self {
        Self {
            node,
            property: property.into(),
            replaced: None,
        }
    }
}

impl Command<Presentation> for SetPropertyCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        self.replaced = target.add_property(self.node, self.property.clone())?;
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        match self.replaced.clone() {
            Some(replaced) => {
                target.add_property(self.node, replaced)?;
            }
            None => {
                target.remove_property(self.node, self.property.kind())?;
            }
        }
        Ok(())
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        target.tree().contains(self.node)
    }

    fn description(&self) -> &str {
        "Set property"
    }

    fn used_assets(&self, _target: &Presentation) -> Vec<AssetRef> {
        property_assets(std::iter::once(&self.property).chain(self.replaced.as_ref()))
    }
}

/// Detaches the property of one kind from a node.
#[derive(Debug)]
pub struct RemovePropertyCommand {
    node: NodeId,
    kind: PropertyKind,
    removed: Option<Property>,
}

impl RemovePropertyCommand {
    pub fn new(node: NodeId, kind: PropertyKind) -> Self {
        Self {
            node,
            kind,
            removed: None,
        }
    }
}

impl Command<Presentation> for RemovePropertyCommand {
    fn execute(&mut self, target: &mut Presentation) -> CommandResult {
        let removed = target.remove_property(self.node, self.kind)?;
        if removed.is_none() {
            return Err(CommandError::CannotExecute(format!(
                "node {} has no {:?} property",
                self.node, self.kind
            )));
        }
        self.removed = removed;
        Ok(())
    }

    fn un_execute(&mut self, target: &mut Presentation) -> CommandResult {
        let removed = self
            .removed
            .clone()
            .ok_or_else(|| CommandError::InvalidState("property was never removed".into()))?;
        target.add_property(self.node, removed)?;
        Ok(())
    }

    fn can_execute(&self, target: &Presentation) -> bool {
        target
            .tree()
            .property(self.node, self.kind)
            .is_ok_and(|property| property.is_some())
    }

    fn description(&self) -> &str {
        "Remove property"
    }

    fn used_assets(&self, _target: &Presentation) -> Vec<AssetRef> {
        property_assets(self.removed.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::channel::{Channel, ChannelKind};
    use crate::property::{ChannelsProperty, XmlProperty};

    fn setup() -> (Presentation, NodeId, ChannelUid) {
        let mut presentation = Presentation::in_memory();
        let text = presentation.add_channel(Channel::new("text", ChannelKind::Text).unwrap());
        let root = presentation.root();
        let node = presentation.create_node();
        presentation.append_child(root, node).unwrap();
        (presentation, node, text)
    }

    #[test]
    fn set_media_undo_removes_created_property() {
        let (mut presentation, node, text) = setup();
        presentation
            .execute(SetMediaCommand::new(node, text, Media::text("Hello")))
            .unwrap();
        assert_eq!(presentation.media(node, text).unwrap(), Some(&Media::text("Hello")));

        presentation.undo().unwrap();
        assert!(presentation.tree().properties(node).unwrap().is_empty());

        presentation.redo().unwrap();
        assert_eq!(presentation.media(node, text).unwrap(), Some(&Media::text("Hello")));
    }

    #[test]
    fn set_media_undo_restores_previous() {
        let (mut presentation, node, text) = setup();
        presentation.set_media(node, text, Media::text("old")).unwrap();
        presentation
            .execute(SetMediaCommand::new(node, text, Media::text("new")))
            .unwrap();
        presentation.undo().unwrap();
        assert_eq!(presentation.media(node, text).unwrap(), Some(&Media::text("old")));
    }

    #[test]
    fn set_media_type_mismatch_refused() {
        let (mut presentation, node, _) = setup();
        let audio = presentation.add_channel(Channel::new("audio", ChannelKind::Audio).unwrap());
        let err = presentation
            .execute(SetMediaCommand::new(node, audio, Media::text("x")))
            .unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::CannotExecute(_))));
    }

    #[test]
    fn set_property_replaces_and_restores() {
        let (mut presentation, node, _) = setup();
        let h1 = XmlProperty::new("h1", "").unwrap();
        presentation.add_property(node, h1.clone().into()).unwrap();

        presentation
            .execute(SetPropertyCommand::new(node, XmlProperty::new("h2", "").unwrap()))
            .unwrap();
        presentation.undo().unwrap();
        assert_eq!(
            presentation.tree().property(node, PropertyKind::Xml).unwrap(),
            Some(&Property::Xml(h1))
        );
    }

    #[test]
    fn set_property_checks_channel_mappings() {
        let (mut presentation, node, text) = setup();
        let mut channels = ChannelsProperty::new();
        channels
            .set_media(presentation.channels(), text, Media::text("ok"))
            .unwrap();
        presentation.remove_channel(text).unwrap();

        let err = presentation
            .execute(SetPropertyCommand::new(node, channels))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(_)));
        assert!(presentation.tree().properties(node).unwrap().is_empty());
    }

    #[test]
    fn remove_property_round_trip() {
        let (mut presentation, node, _) = setup();
        presentation
            .add_property(node, XmlProperty::new("p", "").unwrap().into())
            .unwrap();

        presentation
            .execute(RemovePropertyCommand::new(node, PropertyKind::Xml))
            .unwrap();
        assert!(presentation.tree().property(node, PropertyKind::Xml).unwrap().is_none());
        presentation.undo().unwrap();
        assert!(presentation.tree().property(node, PropertyKind::Xml).unwrap().is_some());

        let missing = RemovePropertyCommand::new(node, PropertyKind::Channels);
        assert!(!missing.can_execute(&presentation));
    }
}
