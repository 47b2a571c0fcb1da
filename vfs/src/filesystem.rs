use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::{Result, VfsError};
use crate::path::normalize;
use crate::provider::StorageProvider;

/// File system storage provider rooted at a directory on disk.
///
/// The root path is joined with the normalized relative path to form the
/// actual filesystem path. All I/O is blocking (`std::fs`).
///
/// # Example
///
/// ```ignore
/// let storage = FileSystemProvider::new("./book");
/// storage.write("data/aud1.pcm", &pcm)?; // writes ./book/data/aud1.pcm
/// ```
pub struct FileSystemProvider {
    root: PathBuf,
}

impl FileSystemProvider {
    /// Create a provider rooted at the given directory.
    ///
    /// The directory does not need to exist yet; it is created on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Resolve a relative path to a full filesystem path.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        Ok(self.root.join(normalize(path)?))
    }

    fn ensure_parent(full_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl StorageProvider for FileSystemProvider {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn read_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        let mut file = fs::File::open(&full_path)?;
        let size = file.metadata()?.len();
        if offset.checked_add(len).is_none_or(|end| end > size) {
            return Err(VfsError::OutOfRange {
                path: path.to_owned(),
                offset,
                len,
                size,
            });
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0; len as usize];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn len(&self, path: &str) -> Result<u64> {
        Ok(fs::metadata(self.resolve(path)?)?.len())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let full_path = if path.trim_matches('/').is_empty() {
            self.root.clone()
        } else {
            self.resolve(path)?
        };
        if !full_path.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(full_path)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_owned());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn absolute_path(&self, path: &str) -> Option<PathBuf> {
        let full_path = self.resolve(path).ok()?;
        Some(fs::canonicalize(&full_path).unwrap_or(full_path))
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        Self::ensure_parent(&full_path)?;
        fs::write(full_path, data)?;
        Ok(())
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        Self::ensure_parent(&full_path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(full_path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path)?;
        fs::remove_file(&full_path)?;
        log::debug!("deleted {}", full_path.display());
        Ok(())
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }
}
