use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, VfsError};
use crate::path::normalize;
use crate::provider::{StorageProvider, slice_range};

/// In-memory storage provider for tests and scratch documents.
///
/// Cloning shares the underlying file map, so a test can keep a handle to
/// inspect what a presentation wrote. Supports both read and write
/// operations.
///
/// Directories are implicit: they exist whenever a file path contains
/// that directory prefix.
///
/// # Example
///
/// ```
/// use talkbook_vfs::{MemoryProvider, StorageProvider};
///
/// let mem = MemoryProvider::new();
/// mem.write("data/aud1.pcm", &[0, 0, 1, 1]).unwrap();
/// mem.append("data/aud1.pcm", &[2, 2]).unwrap();
/// assert_eq!(mem.len("data/aud1.pcm").unwrap(), 6);
/// ```
#[derive(Clone)]
pub struct MemoryProvider {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryProvider {
    /// Create an empty in-memory provider.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a file at the given (already normalized) path.
    ///
    /// Overwrites any existing file at the same path.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        self.files.write().insert(path.into(), data);
    }

    /// Remove a file at the given path, returning its data if it existed.
    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files.write().remove(path)
    }

    /// Number of stored files.
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageProvider for MemoryProvider {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path)?;
        let map = self.files.read();
        map.get(&path).cloned().ok_or(VfsError::NotFound(path))
    }

    fn read_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        let path = normalize(path)?;
        let map = self.files.read();
        let data = map
            .get(&path)
            .ok_or_else(|| VfsError::NotFound(path.clone()))?;
        slice_range(&path, data, offset, len).map(<[u8]>::to_vec)
    }

    fn len(&self, path: &str) -> Result<u64> {
        let path = normalize(path)?;
        let map = self.files.read();
        map.get(&path)
            .map(|data| data.len() as u64)
            .ok_or(VfsError::NotFound(path))
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize(path)?;
        Ok(self.files.read().contains_key(&path))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let prefix = if path.trim_matches('/').is_empty() {
            String::new()
        } else {
            format!("{}/", normalize(path)?)
        };

        let map = self.files.read();
        let mut children = BTreeSet::new();
        for key in map.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                // Immediate child name (first segment)
                let child = match rest.find('/') {
                    Some(pos) => &rest[..pos],
                    None => rest,
                };
                if !child.is_empty() {
                    children.insert(child.to_owned());
                }
            }
        }
        Ok(children.into_iter().collect())
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path)?;
        self.files.write().insert(path, data.to_vec());
        Ok(())
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path)?;
        self.files
            .write()
            .entry(path)
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        self.files
            .write()
            .remove(&path)
            .ok_or(VfsError::NotFound(path))?;
        Ok(())
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        // Directories are implicit in MemoryProvider
        normalize(path)?;
        Ok(())
    }
}
