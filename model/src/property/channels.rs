use std::collections::BTreeMap;

use crate::channel::{ChannelUid, ChannelsManager};
use crate::error::{Error, Result};
use crate::media::Media;
use crate::media_data::MediaDataUid;

/// Maps channels to media on one node. At most one media per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelsProperty {
    media: BTreeMap<ChannelUid, Media>,
}

impl ChannelsProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `media` on `channel` and returns the previous mapping.
    ///
    /// Fails with [`Error::UnknownChannel`] if `channels` does not know the
    /// channel, and with [`Error::TypeMismatch`] if the channel rejects the
    /// media's kind. On failure the mapping is untouched.
    pub fn set_media(
        &mut self,
        channels: &ChannelsManager,
        channel: ChannelUid,
        media: Media,
    ) -> Result<Option<Media>> {
        check_media(channels, channel, &media)?;
        Ok(self.media.insert(channel, media))
    }

    /// The media on `channel`, `None` if nothing is mapped.
    pub fn media(&self, channel: ChannelUid) -> Option<&Media> {
        self.media.get(&channel)
    }

    pub fn clear_media(&mut self, channel: ChannelUid) -> Option<Media> {
        self.media.remove(&channel)
    }

    /// Channels with a mapping, in UID order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelUid> + '_ {
        self.media.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelUid, &Media)> {
        self.media.iter().map(|(channel, media)| (*channel, media))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (ChannelUid, &mut Media)> {
        self.media.iter_mut().map(|(channel, media)| (*channel, media))
    }

    /// Managed media data referenced by any mapping.
    pub fn media_data_uids(&self) -> impl Iterator<Item = MediaDataUid> + '_ {
        self.media.values().filter_map(Media::media_data)
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Checks that `channel` is registered and accepts `media`.
pub(crate) fn check_media(channels: &ChannelsManager, channel: ChannelUid, media: &Media) -> Result<()> {
    let target = channels.require(channel)?;
    if !target.accepts(media.kind()) {
        return Err(Error::TypeMismatch {
            channel: target.name().to_owned(),
            media: media.kind(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelKind};
    use talkbook_core::Uid;

    fn setup() -> (ChannelsManager, ChannelUid, ChannelUid) {
        let mut channels = ChannelsManager::new();
        let text = channels.add(Channel::new("text", ChannelKind::Text).unwrap());
        let audio = channels.add(Channel::new("audio", ChannelKind::ManagedAudio).unwrap());
        (channels, text, audio)
    }

    #[test]
    fn set_and_get() {
        let (channels, text, _) = setup();
        let mut property = ChannelsProperty::new();
        assert_eq!(property.set_media(&channels, text, Media::text("Hello")).unwrap(), None);
        assert_eq!(property.media(text).and_then(Media::as_text), Some("Hello"));

        let previous = property.set_media(&channels, text, Media::text("Bye")).unwrap();
        assert_eq!(previous, Some(Media::text("Hello")));
    }

    #[test]
    fn type_mismatch_keeps_previous_mapping() {
        let (channels, text, _) = setup();
        let mut property = ChannelsProperty::new();
        property.set_media(&channels, text, Media::text("Keep")).unwrap();

        let err = property
            .set_media(&channels, text, Media::managed_audio(Uid::from_raw(1)))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert_eq!(property.media(text), Some(&Media::text("Keep")));
    }

    #[test]
    fn unknown_channel_rejected() {
        let (channels, _, _) = setup();
        let mut property = ChannelsProperty::new();
        let err = property
            .set_media(&channels, Uid::from_raw(99), Media::text("x"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(_)));
        assert!(property.is_empty());
    }

    #[test]
    fn media_data_uids_lists_managed_only() {
        let (channels, text, audio) = setup();
        let mut property = ChannelsProperty::new();
        property.set_media(&channels, text, Media::text("t")).unwrap();
        property
            .set_media(&channels, audio, Media::managed_audio(Uid::from_raw(5)))
            .unwrap();
        let uids: Vec<_> = property.media_data_uids().collect();
        assert_eq!(uids, vec![Uid::from_raw(5)]);
        assert_eq!(property.clear_media(audio), Some(Media::managed_audio(Uid::from_raw(5))));
        assert_eq!(property.media_data_uids().count(), 0);
    }
}
