//! Orthogonal media capabilities.
//!
//! Concrete media types implement the subset that applies to them instead of
//! sitting in an inheritance chain. Timed media implement [`Clippable`] and
//! get [`Continuous`] for free; untimed media are [`Discrete`].

use std::time::Duration;

use crate::error::{Error, Result};

/// Media with a playback duration.
pub trait Continuous {
    fn duration(&self) -> Duration;
}

/// Media without a time extent (text, still images).
pub trait Discrete {}

/// Media played between a begin and an end offset.
pub trait Clippable {
    fn clip_begin(&self) -> Duration;
    fn clip_end(&self) -> Duration;

    /// Sets both clip bounds. `begin` must not be after `end`.
    fn set_clip(&mut self, begin: Duration, end: Duration) -> Result<()>;
}

impl<T: Clippable> Continuous for T {
    fn duration(&self) -> Duration {
        self.clip_end().saturating_sub(self.clip_begin())
    }
}

/// Media whose content lives at an external location.
pub trait Located {
    fn src(&self) -> &str;

    /// Replaces the location. Empty strings are rejected.
    fn set_src(&mut self, src: String) -> Result<()>;
}

/// Media with pixel dimensions.
pub trait Sizable {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn set_size(&mut self, width: u32, height: u32);
}

pub(crate) fn check_clip(begin: Duration, end: Duration) -> Result<()> {
    if begin > end {
        return Err(Error::InvalidArgument(format!(
            "clip begin {begin:?} is after clip end {end:?}"
        )));
    }
    Ok(())
}

pub(crate) fn check_src(src: &str) -> Result<()> {
    if src.is_empty() {
        return Err(Error::InvalidArgument("media src must not be empty".into()));
    }
    Ok(())
}
