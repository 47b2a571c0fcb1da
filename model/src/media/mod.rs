//! Media objects attached to tree nodes through channels.
//!
//! [`Media`] is a closed set of concrete kinds. Behavior shared between kinds
//! is expressed through the capability traits in [`capabilities`], queried
//! with [`Media::as_continuous`], [`Media::as_located`] and friends.

pub mod capabilities;
mod kinds;

use std::fmt;

pub use capabilities::{Clippable, Continuous, Discrete, Located, Sizable};
pub use kinds::{
    ExternalAudioMedia, ExternalImageMedia, ExternalTextMedia, ExternalVideoMedia,
    ManagedAudioMedia, TextMedia,
};

use crate::media_data::MediaDataUid;

/// Discriminant of a [`Media`] value, used for channel acceptance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Text,
    ExternalText,
    ExternalAudio,
    ManagedAudio,
    ExternalImage,
    ExternalVideo,
}

impl MediaKind {
    /// Audio of any storage flavor.
    pub fn is_audio(self) -> bool {
        matches!(self, MediaKind::ExternalAudio | MediaKind::ManagedAudio)
    }

    /// Text of any storage flavor.
    pub fn is_text(self) -> bool {
        matches!(self, MediaKind::Text | MediaKind::ExternalText)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Text(TextMedia),
    ExternalText(ExternalTextMedia),
    ExternalAudio(ExternalAudioMedia),
    ManagedAudio(ManagedAudioMedia),
    ExternalImage(ExternalImageMedia),
    ExternalVideo(ExternalVideoMedia),
}

impl Media {
    /// Shorthand for inline text media.
    pub fn text(text: impl Into<String>) -> Self {
        Media::Text(TextMedia::new(text))
    }

    /// Shorthand for managed audio referencing `media_data`.
    pub fn managed_audio(media_data: MediaDataUid) -> Self {
        Media::ManagedAudio(ManagedAudioMedia::new(media_data))
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Text(_) => MediaKind::Text,
            Media::ExternalText(_) => MediaKind::ExternalText,
            Media::ExternalAudio(_) => MediaKind::ExternalAudio,
            Media::ManagedAudio(_) => MediaKind::ManagedAudio,
            Media::ExternalImage(_) => MediaKind::ExternalImage,
            Media::ExternalVideo(_) => MediaKind::ExternalVideo,
        }
    }

    /// The pool-managed media data behind this media, if any.
    pub fn media_data(&self) -> Option<MediaDataUid> {
        match self {
            Media::ManagedAudio(audio) => Some(audio.media_data),
            _ => None,
        }
    }

    /// Returns a copy of this media pointing at a different media data entry.
    ///
    /// Media without managed data is returned unchanged.
    pub fn with_media_data(&self, media_data: MediaDataUid) -> Media {
        match self {
            Media::ManagedAudio(_) => Media::managed_audio(media_data),
            other => other.clone(),
        }
    }

    /// The inline text, for [`Media::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Media::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Timed media with an intrinsic duration.
    ///
    /// Managed audio is timed but its duration lives in the media data pool,
    /// so it is not returned here.
    pub fn as_continuous(&self) -> Option<&dyn Continuous> {
        match self {
            Media::ExternalAudio(audio) => Some(audio),
            Media::ExternalVideo(video) => Some(video),
            _ => None,
        }
    }

    pub fn as_clippable_mut(&mut self) -> Option<&mut dyn Clippable> {
        match self {
            Media::ExternalAudio(audio) => Some(audio),
            Media::ExternalVideo(video) => Some(video),
            _ => None,
        }
    }

    pub fn as_located(&self) -> Option<&dyn Located> {
        match self {
            Media::ExternalText(text) => Some(text),
            Media::ExternalAudio(audio) => Some(audio),
            Media::ExternalImage(image) => Some(image),
            Media::ExternalVideo(video) => Some(video),
            _ => None,
        }
    }

    pub fn as_sizable(&self) -> Option<&dyn Sizable> {
        match self {
            Media::ExternalImage(image) => Some(image),
            Media::ExternalVideo(video) => Some(video),
            _ => None,
        }
    }

    /// Returns `true` for media without a time extent.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Media::Text(_) | Media::ExternalText(_) | Media::ExternalImage(_)
        )
    }

    /// Returns `true` for timed media, managed or not.
    pub fn is_continuous(&self) -> bool {
        !self.is_discrete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use talkbook_core::Uid;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Media::text("hi").kind(), MediaKind::Text);
        assert_eq!(
            Media::managed_audio(Uid::from_raw(1)).kind(),
            MediaKind::ManagedAudio
        );
        assert!(MediaKind::ManagedAudio.is_audio());
        assert!(MediaKind::ExternalText.is_text());
    }

    #[test]
    fn only_managed_audio_has_media_data() {
        let uid = Uid::from_raw(3);
        assert_eq!(Media::managed_audio(uid).media_data(), Some(uid));
        assert_eq!(Media::text("x").media_data(), None);
    }

    #[test]
    fn clippable_media_is_continuous() {
        let audio = ExternalAudioMedia::new(
            "intro.mp3",
            Duration::from_millis(500),
            Duration::from_millis(2500),
        )
        .unwrap();
        let media = Media::ExternalAudio(audio);
        assert_eq!(
            media.as_continuous().map(|c| c.duration()),
            Some(Duration::from_secs(2))
        );
        assert_eq!(media.as_located().map(|l| l.src()), Some("intro.mp3"));
        assert!(media.as_sizable().is_none());
        assert!(media.is_continuous());
    }

    #[test]
    fn inverted_clip_rejected() {
        let result = ExternalAudioMedia::new("a.mp3", Duration::from_secs(2), Duration::from_secs(1));
        assert!(result.is_err());

        let mut video =
            Media::ExternalVideo(ExternalVideoMedia::new("v.mp4", 640, 480, Duration::ZERO, Duration::from_secs(4)).unwrap());
        let clip = video.as_clippable_mut().unwrap();
        assert!(clip.set_clip(Duration::from_secs(3), Duration::from_secs(1)).is_err());
        assert_eq!(clip.clip_end(), Duration::from_secs(4));
    }

    #[test]
    fn image_is_discrete_and_sized() {
        let mut image = ExternalImageMedia::new("cover.png", 600, 800).unwrap();
        image.set_size(300, 400);
        let media = Media::ExternalImage(image);
        assert!(media.is_discrete());
        assert_eq!(media.as_sizable().map(|s| (s.width(), s.height())), Some((300, 400)));
    }

    #[test]
    fn empty_src_rejected() {
        assert!(ExternalTextMedia::new("").is_err());
        let mut text = ExternalTextMedia::new("notes.txt").unwrap();
        assert!(text.set_src(String::new()).is_err());
        assert_eq!(text.src(), "notes.txt");
    }

    #[test]
    fn with_media_data_rebinds_managed_only() {
        let old = Media::managed_audio(Uid::from_raw(1));
        assert_eq!(old.with_media_data(Uid::from_raw(2)).media_data(), Some(Uid::from_raw(2)));
        let text = Media::text("t");
        assert_eq!(text.with_media_data(Uid::from_raw(2)), text);
    }
}
