//! Pool-managed media assets.
//!
//! A [`MediaData`] is the payload behind managed media (e.g. the samples of
//! a managed audio clip). It depends on one or more data providers for its
//! bytes; several media data may share a provider.
//!
//! Media data is owned exclusively by the [`MediaDataPool`]. Tree nodes and
//! commands refer to it by [`MediaDataUid`] only, and nothing is freed until
//! an explicit cleanup pass.

mod audio;

use std::fmt;
use std::time::Duration;

use talkbook_core::{AsAny, Registry, Uid};

pub use audio::{AudioClip, PcmFormat, WavAudioMediaData};

use crate::data_provider::DataProviderUid;
use crate::error::{Error, Result};

/// Handle of a media data entry.
pub type MediaDataUid = Uid<dyn MediaData>;

const KIND: &str = "media data";

/// A media asset stored in the pool.
pub trait MediaData: AsAny + fmt::Debug + Send + Sync {
    /// Stable type tag, e.g. for serialization.
    fn type_name(&self) -> &'static str;

    /// Every data provider this media data reads from.
    fn used_data_providers(&self) -> Vec<DataProviderUid>;

    fn duration(&self) -> Duration;

    /// A copy sharing the same data providers.
    fn boxed_copy(&self) -> Box<dyn MediaData>;
}

/// Owns every media data entry of a presentation.
#[derive(Default)]
pub struct MediaDataPool {
    entries: Registry<dyn MediaData>,
}

impl MediaDataPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manage(&mut self, media_data: Box<dyn MediaData>) -> MediaDataUid {
        self.entries.manage(media_data)
    }

    /// The UID the next [`manage`](Self::manage) will assign.
    pub(crate) fn next_uid(&self) -> MediaDataUid {
        self.entries.peek_next_uid()
    }

    /// Registers media data under a caller-supplied UID.
    pub fn manage_with_uid(&mut self, uid: MediaDataUid, media_data: Box<dyn MediaData>) -> Result<()> {
        self.entries
            .manage_with_uid(uid, media_data)
            .map_err(|e| Error::registry(KIND, e))
    }

    pub fn unmanage(&mut self, uid: MediaDataUid) -> Result<Box<dyn MediaData>> {
        self.entries
            .unmanage(uid)
            .map_err(|e| Error::registry(KIND, e))
    }

    pub fn get(&self, uid: MediaDataUid) -> Option<&dyn MediaData> {
        self.entries.get(uid)
    }

    pub fn get_mut(&mut self, uid: MediaDataUid) -> Option<&mut (dyn MediaData + 'static)> {
        self.entries.get_mut(uid)
    }

    /// Looks up `uid` and downcasts it to `T`.
    pub fn get_as<T: MediaData>(&self, uid: MediaDataUid) -> Result<&T> {
        let entry = self
            .entries
            .get(uid)
            .ok_or(Error::not_managed(KIND, uid.raw()))?;
        entry
            .as_any()
            .downcast_ref::<T>()
            .ok_or(Error::WrongMediaData {
                uid: uid.raw(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Mutable [`get_as`](Self::get_as).
    pub fn get_as_mut<T: MediaData>(&mut self, uid: MediaDataUid) -> Result<&mut T> {
        let entry = self
            .entries
            .get_mut(uid)
            .ok_or(Error::not_managed(KIND, uid.raw()))?;
        entry
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(Error::WrongMediaData {
                uid: uid.raw(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, uid: MediaDataUid) -> bool {
        self.entries.contains(uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = MediaDataUid> + '_ {
        self.entries.uids()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediaDataUid, &(dyn MediaData + 'static))> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MediaDataPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDataPool")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> PcmFormat {
        PcmFormat::new(1, 8000, 16).unwrap()
    }

    #[test]
    fn typed_lookup() {
        let mut pool = MediaDataPool::new();
        let uid = pool.manage(Box::new(WavAudioMediaData::new(format())));
        let wav = pool.get_as::<WavAudioMediaData>(uid).unwrap();
        assert_eq!(wav.format(), format());
        assert_eq!(pool.get(uid).unwrap().type_name(), "WavAudioMediaData");
    }

    #[test]
    fn unknown_uid_is_not_managed() {
        let pool = MediaDataPool::new();
        assert!(matches!(
            pool.get_as::<WavAudioMediaData>(Uid::from_raw(9)),
            Err(Error::NotManaged { uid: 9, .. })
        ));
    }

    #[test]
    fn unmanage_returns_entry() {
        let mut pool = MediaDataPool::new();
        let uid = pool.manage(Box::new(WavAudioMediaData::new(format())));
        let entry = pool.unmanage(uid).unwrap();
        assert_eq!(entry.duration(), Duration::ZERO);
        assert!(pool.is_empty());
        assert!(pool.unmanage(uid).is_err());
    }
}
