//! Named, type-constrained lanes for attaching media to nodes.

use talkbook_core::{Registry, Uid};

use crate::error::{Error, Result};
use crate::media::MediaKind;

/// Handle of a registered channel.
pub type ChannelUid = Uid<Channel>;

const KIND: &str = "channel";

/// Which media a channel accepts.
///
/// `ManagedAudio` is a strict subtype of `Audio`: it takes only audio whose
/// samples live in the media data pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Text,
    Audio,
    ManagedAudio,
    Image,
    Video,
    Any,
}

impl ChannelKind {
    pub fn accepts(self, media: MediaKind) -> bool {
        match self {
            ChannelKind::Text => media.is_text(),
            ChannelKind::Audio => media.is_audio(),
            ChannelKind::ManagedAudio => media == MediaKind::ManagedAudio,
            ChannelKind::Image => media == MediaKind::ExternalImage,
            ChannelKind::Video => media == MediaKind::ExternalVideo,
            ChannelKind::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    name: String,
    language: Option<String>,
    kind: ChannelKind,
}

impl Channel {
    /// Fails if `name` is empty.
    pub fn new(name: impl Into<String>, kind: ChannelKind) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("channel name must not be empty".into()));
        }
        Ok(Self {
            name,
            language: None,
            kind,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn accepts(&self, media: MediaKind) -> bool {
        self.kind.accepts(media)
    }
}

/// Registry of the channels of one presentation.
#[derive(Debug, Default)]
pub struct ChannelsManager {
    channels: Registry<Channel>,
}

impl ChannelsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Channel) -> ChannelUid {
        self.channels.manage(Box::new(channel))
    }

    pub fn remove(&mut self, uid: ChannelUid) -> Result<Channel> {
        self.channels
            .unmanage(uid)
            .map(|channel| *channel)
            .map_err(|e| Error::registry(KIND, e))
    }

    pub fn get(&self, uid: ChannelUid) -> Option<&Channel> {
        self.channels.get(uid)
    }

    /// Like [`get`](Self::get), failing with [`Error::UnknownChannel`].
    pub fn require(&self, uid: ChannelUid) -> Result<&Channel> {
        self.channels.get(uid).ok_or(Error::UnknownChannel(uid))
    }

    pub fn contains(&self, uid: ChannelUid) -> bool {
        self.channels.contains(uid)
    }

    /// First channel (lowest UID) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ChannelUid> {
        self.channels
            .iter()
            .find(|(_, channel)| channel.name == name)
            .map(|(uid, _)| uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = ChannelUid> + '_ {
        self.channels.uids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelUid, &Channel)> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ChannelKind::Text, MediaKind::Text, true)]
    #[case(ChannelKind::Text, MediaKind::ExternalText, true)]
    #[case(ChannelKind::Text, MediaKind::ManagedAudio, false)]
    #[case(ChannelKind::Audio, MediaKind::ExternalAudio, true)]
    #[case(ChannelKind::Audio, MediaKind::ManagedAudio, true)]
    #[case(ChannelKind::Audio, MediaKind::Text, false)]
    #[case(ChannelKind::ManagedAudio, MediaKind::ManagedAudio, true)]
    #[case(ChannelKind::ManagedAudio, MediaKind::ExternalAudio, false)]
    #[case(ChannelKind::Image, MediaKind::ExternalImage, true)]
    #[case(ChannelKind::Image, MediaKind::ExternalVideo, false)]
    #[case(ChannelKind::Video, MediaKind::ExternalVideo, true)]
    #[case(ChannelKind::Any, MediaKind::ExternalImage, true)]
    fn acceptance(#[case] channel: ChannelKind, #[case] media: MediaKind, #[case] expected: bool) {
        assert_eq!(channel.accepts(media), expected);
    }

    #[test]
    fn empty_name_rejected() {
        assert!(Channel::new("", ChannelKind::Text).is_err());
    }

    #[test]
    fn add_find_remove() {
        let mut manager = ChannelsManager::new();
        let text = manager.add(Channel::new("text", ChannelKind::Text).unwrap().with_language("en"));
        let audio = manager.add(Channel::new("audio", ChannelKind::Audio).unwrap());

        assert_eq!(manager.find_by_name("audio"), Some(audio));
        assert_eq!(manager.get(text).unwrap().language(), Some("en"));
        assert_eq!(manager.len(), 2);

        let removed = manager.remove(text).unwrap();
        assert_eq!(removed.name(), "text");
        assert!(!manager.contains(text));
        assert!(matches!(manager.require(text), Err(Error::UnknownChannel(_))));
        assert!(matches!(manager.remove(text), Err(Error::NotManaged { .. })));
    }
}
