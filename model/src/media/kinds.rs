//! Concrete media types.

use std::time::Duration;

use super::capabilities::{Clippable, Discrete, Located, Sizable, check_clip, check_src};
use crate::error::Result;
use crate::media_data::MediaDataUid;

/// Inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMedia {
    pub text: String,
}

impl TextMedia {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Discrete for TextMedia {}

/// Text stored in an external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTextMedia {
    src: String,
}

impl ExternalTextMedia {
    pub fn new(src: impl Into<String>) -> Result<Self> {
        let src = src.into();
        check_src(&src)?;
        Ok(Self { src })
    }
}

impl Discrete for ExternalTextMedia {}

impl Located for ExternalTextMedia {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, src: String) -> Result<()> {
        check_src(&src)?;
        self.src = src;
        Ok(())
    }
}

/// A clip of an external audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAudioMedia {
    src: String,
    clip_begin: Duration,
    clip_end: Duration,
}

impl ExternalAudioMedia {
    pub fn new(src: impl Into<String>, clip_begin: Duration, clip_end: Duration) -> Result<Self> {
        let src = src.into();
        check_src(&src)?;
        check_clip(clip_begin, clip_end)?;
        Ok(Self {
            src,
            clip_begin,
            clip_end,
        })
    }
}

impl Clippable for ExternalAudioMedia {
    fn clip_begin(&self) -> Duration {
        self.clip_begin
    }

    fn clip_end(&self) -> Duration {
        self.clip_end
    }

    fn set_clip(&mut self, begin: Duration, end: Duration) -> Result<()> {
        check_clip(begin, end)?;
        self.clip_begin = begin;
        self.clip_end = end;
        Ok(())
    }
}

impl Located for ExternalAudioMedia {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, src: String) -> Result<()> {
        check_src(&src)?;
        self.src = src;
        Ok(())
    }
}

/// Audio held in the presentation's media data pool.
///
/// Its duration depends on the referenced media data; see
/// [`Presentation::media_duration`](crate::Presentation::media_duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedAudioMedia {
    pub media_data: MediaDataUid,
}

impl ManagedAudioMedia {
    pub fn new(media_data: MediaDataUid) -> Self {
        Self { media_data }
    }
}

/// An external still image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalImageMedia {
    src: String,
    width: u32,
    height: u32,
}

impl ExternalImageMedia {
    pub fn new(src: impl Into<String>, width: u32, height: u32) -> Result<Self> {
        let src = src.into();
        check_src(&src)?;
        Ok(Self { src, width, height })
    }
}

impl Discrete for ExternalImageMedia {}

impl Located for ExternalImageMedia {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, src: String) -> Result<()> {
        check_src(&src)?;
        self.src = src;
        Ok(())
    }
}

impl Sizable for ExternalImageMedia {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// A clip of an external video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalVideoMedia {
    src: String,
    width: u32,
    height: u32,
    clip_begin: Duration,
    clip_end: Duration,
}

impl ExternalVideoMedia {
    pub fn new(
        src: impl Into<String>,
        width: u32,
        height: u32,
        clip_begin: Duration,
        clip_end: Duration,
    ) -> Result<Self> {
        let src = src.into();
        check_src(&src)?;
        check_clip(clip_begin, clip_end)?;
        Ok(Self {
            src,
            width,
            height,
            clip_begin,
            clip_end,
        })
    }
}

impl Clippable for ExternalVideoMedia {
    fn clip_begin(&self) -> Duration {
        self.clip_begin
    }

    fn clip_end(&self) -> Duration {
        self.clip_end
    }

    fn set_clip(&mut self, begin: Duration, end: Duration) -> Result<()> {
        check_clip(begin, end)?;
        self.clip_begin = begin;
        self.clip_end = end;
        Ok(())
    }
}

impl Located for ExternalVideoMedia {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, src: String) -> Result<()> {
        check_src(&src)?;
        self.src = src;
        Ok(())
    }
}

impl Sizable for ExternalVideoMedia {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}
