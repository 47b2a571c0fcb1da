//! Node annotations.
//!
//! A node carries at most one [`Property`] of each [`PropertyKind`]. The
//! [`PropertySet`] enforces that by keying on the kind: attaching a property
//! of a kind that is already present replaces the old one.

mod channels;
mod xml;

use std::collections::BTreeMap;

pub use channels::ChannelsProperty;
pub(crate) use channels::check_media;
pub use xml::XmlProperty;

use crate::media_data::MediaDataUid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    Channels,
    Xml,
}

/// A node annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Channels(ChannelsProperty),
    Xml(XmlProperty),
}

impl Property {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Property::Channels(_) => PropertyKind::Channels,
            Property::Xml(_) => PropertyKind::Xml,
        }
    }

    pub fn as_channels(&self) -> Option<&ChannelsProperty> {
        match self {
            Property::Channels(channels) => Some(channels),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlProperty> {
        match self {
            Property::Xml(xml) => Some(xml),
            _ => None,
        }
    }

    /// Managed media data referenced by this property.
    pub fn media_data_uids(&self) -> Vec<MediaDataUid> {
        match self {
            Property::Channels(channels) => channels.media_data_uids().collect(),
            Property::Xml(_) => Vec::new(),
        }
    }
}

impl From<ChannelsProperty> for Property {
    fn from(property: ChannelsProperty) -> Self {
        Property::Channels(property)
    }
}

impl From<XmlProperty> for Property {
    fn from(property: XmlProperty) -> Self {
        Property::Xml(property)
    }
}

/// The properties of one node, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    properties: BTreeMap<PropertyKind, Property>,
}

impl PropertySet {
    /// Attaches `property`, returning the one of the same kind it replaced.
    pub fn insert(&mut self, property: Property) -> Option<Property> {
        self.properties.insert(property.kind(), property)
    }

    pub fn remove(&mut self, kind: PropertyKind) -> Option<Property> {
        self.properties.remove(&kind)
    }

    pub fn get(&self, kind: PropertyKind) -> Option<&Property> {
        self.properties.get(&kind)
    }

    pub fn contains(&self, kind: PropertyKind) -> bool {
        self.properties.contains_key(&kind)
    }

    pub fn channels(&self) -> Option<&ChannelsProperty> {
        self.get(PropertyKind::Channels).and_then(Property::as_channels)
    }

    pub fn channels_mut(&mut self) -> Option<&mut ChannelsProperty> {
        match self.properties.get_mut(&PropertyKind::Channels) {
            Some(Property::Channels(channels)) => Some(channels),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Managed media data referenced by any property.
    pub fn media_data_uids(&self) -> impl Iterator<Item = MediaDataUid> + '_ {
        self.channels()
            .into_iter()
            .flat_map(ChannelsProperty::media_data_uids)
    }
}
