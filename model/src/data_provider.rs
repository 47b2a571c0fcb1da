//! Raw byte storage handles and their pool.
//!
//! A [`DataProvider`] names one blob (typically a file) under the pool's
//! base directory. The [`DataProviderPool`] owns every provider of a
//! presentation and is the only way to reach the bytes.
//!
//! Unmanaging a provider only drops the mapping; [`DataProviderPool::destroy`]
//! also deletes the backing blob.

use std::path::PathBuf;
use std::sync::Arc;

use talkbook_core::{Registry, Uid};
use talkbook_vfs::{StorageProvider, path};

use crate::error::{Error, Result};

/// Handle of a data provider.
pub type DataProviderUid = Uid<DataProvider>;

const KIND: &str = "data provider";

/// MIME type of raw PCM sample data.
pub const MIME_PCM: &str = "audio/x-pcm";

/// A blob under the pool's base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProvider {
    relative_path: String,
    mime_type: String,
}

impl DataProvider {
    /// Describes an existing blob. Used when identity is carried in from
    /// outside (see [`DataProviderPool::manage_with_uid`]).
    pub fn new(relative_path: impl Into<String>, mime_type: impl Into<String>) -> Result<Self> {
        let relative_path = path::normalize(&relative_path.into())?;
        Ok(Self {
            relative_path,
            mime_type: mime_type.into(),
        })
    }

    /// Path relative to the pool's base directory.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        MIME_PCM => "pcm",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "text/plain" => "txt",
        _ => "bin",
    }
}

/// Pool of data providers over one storage backend.
pub struct DataProviderPool {
    storage: Arc<dyn StorageProvider>,
    base_dir: String,
    providers: Registry<DataProvider>,
    next_file: u64,
}

impl DataProviderPool {
    /// Creates an empty pool storing blobs under `base_dir` (empty for the
    /// storage root).
    pub fn new(storage: Arc<dyn StorageProvider>, base_dir: impl Into<String>) -> Self {
        Self {
            storage,
            base_dir: base_dir.into(),
            providers: Registry::new(),
            next_file: 1,
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Moves the pool to another base directory.
    ///
    /// Only allowed while the pool is empty; existing relative paths would
    /// otherwise point at nothing.
    pub fn set_base_dir(&mut self, base_dir: &str) -> Result<()> {
        if !self.providers.is_empty() {
            return Err(Error::AlreadyInitialized("data provider pool base directory"));
        }
        self.base_dir = if base_dir.trim_matches('/').is_empty() {
            String::new()
        } else {
            path::normalize(base_dir)?
        };
        Ok(())
    }

    /// Creates an empty blob with a fresh file name and registers it.
    pub fn create(&mut self, mime_type: &str) -> Result<DataProviderUid> {
        let extension = extension_for(mime_type);
        let relative_path = loop {
            let candidate = format!("{:06}.{extension}", self.next_file);
            self.next_file += 1;
            if !self.storage.exists(&path::join(&self.base_dir, &candidate)?)? {
                break candidate;
            }
        };
        self.storage
            .write(&path::join(&self.base_dir, &relative_path)?, &[])?;
        let uid = self.providers.manage(Box::new(DataProvider {
            relative_path,
            mime_type: mime_type.to_owned(),
        }));
        log::debug!("created data provider {uid} ({mime_type})");
        Ok(uid)
    }

    /// Registers an existing blob under a caller-supplied UID.
    pub fn manage_with_uid(&mut self, uid: DataProviderUid, provider: DataProvider) -> Result<()> {
        self.providers
            .manage_with_uid(uid, Box::new(provider))
            .map_err(|e| Error::registry(KIND, e))
    }

    pub(crate) fn next_uid(&self) -> DataProviderUid {
        self.providers.peek_next_uid()
    }

    pub fn get(&self, uid: DataProviderUid) -> Option<&DataProvider> {
        self.providers.get(uid)
    }

    pub fn contains(&self, uid: DataProviderUid) -> bool {
        self.providers.contains(uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = DataProviderUid> + '_ {
        self.providers.uids()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn provider(&self, uid: DataProviderUid) -> Result<&DataProvider> {
        self.providers
            .get(uid)
            .ok_or(Error::not_managed(KIND, uid.raw()))
    }

    fn storage_path(&self, provider: &DataProvider) -> Result<String> {
        Ok(path::join(&self.base_dir, &provider.relative_path)?)
    }

    fn path_of(&self, uid: DataProviderUid) -> Result<String> {
        self.storage_path(self.provider(uid)?)
    }

    pub fn read_all(&self, uid: DataProviderUid) -> Result<Vec<u8>> {
        Ok(self.storage.read(&self.path_of(uid)?)?)
    }

    pub fn read_range(&self, uid: DataProviderUid, offset: u64, len: u64) -> Result<Vec<u8>> {
        Ok(self.storage.read_range(&self.path_of(uid)?, offset, len)?)
    }

    /// Replaces the blob's content.
    pub fn write(&self, uid: DataProviderUid, data: &[u8]) -> Result<()> {
        Ok(self.storage.write(&self.path_of(uid)?, data)?)
    }

    pub fn append(&self, uid: DataProviderUid, data: &[u8]) -> Result<()> {
        Ok(self.storage.append(&self.path_of(uid)?, data)?)
    }

    /// Size of the blob in bytes.
    pub fn len_of(&self, uid: DataProviderUid) -> Result<u64> {
        Ok(self.storage.len(&self.path_of(uid)?)?)
    }

    /// Byte-copies a provider into a new one with the same MIME type.
    pub fn copy(&mut self, uid: DataProviderUid) -> Result<DataProviderUid> {
        let mime_type = self.provider(uid)?.mime_type.clone();
        let data = self.read_all(uid)?;
        let copy = self.create(&mime_type)?;
        self.write(copy, &data)?;
        Ok(copy)
    }

    pub fn relative_path(&self, uid: DataProviderUid) -> Result<&str> {
        Ok(self.provider(uid)?.relative_path())
    }

    /// Resolved on-disk path, for storage backends that have one.
    pub fn absolute_path(&self, uid: DataProviderUid) -> Result<Option<PathBuf>> {
        Ok(self.storage.absolute_path(&self.path_of(uid)?))
    }

    /// Drops the mapping for `uid` and returns the provider. The blob stays.
    pub fn unmanage(&mut self, uid: DataProviderUid) -> Result<DataProvider> {
        self.providers
            .unmanage(uid)
            .map(|provider| *provider)
            .map_err(|e| Error::registry(KIND, e))
    }

    /// Unmanages `uid`, then deletes its blob.
    ///
    /// A failed delete is returned, but the provider stays unmanaged.
    pub fn destroy(&mut self, uid: DataProviderUid) -> Result<()> {
        let provider = self.unmanage(uid)?;
        self.delete_blob(&provider)
    }

    /// Deletes the blob of an already unmanaged provider.
    pub(crate) fn delete_blob(&self, provider: &DataProvider) -> Result<()> {
        let storage_path = self.storage_path(provider)?;
        self.storage.delete(&storage_path)?;
        Ok(())
    }
}

impl std::fmt::Debug for DataProviderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataProviderPool")
            .field("base_dir", &self.base_dir)
            .field("providers", &self.providers.len())
            .finish()
    }
}
