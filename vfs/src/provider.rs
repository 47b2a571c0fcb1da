use std::path::PathBuf;

use crate::{Result, VfsError};

/// Trait for byte storage backends.
///
/// All operations are synchronous and complete before returning. Providers
/// are `Send + Sync` so a presentation can hold one behind an `Arc`.
///
/// # Read vs Write
///
/// All providers must implement read operations (`read`, `exists`, `list_dir`).
/// Write operations (`write`, `append`, `delete`, `create_dir`) have default
/// implementations that return [`VfsError::ReadOnly`]. Providers that support
/// writes override these methods and return `false` from
/// [`is_read_only()`](StorageProvider::is_read_only).
///
/// # Path Contract
///
/// Paths are relative to the provider's root. Implementations normalize them
/// with [`crate::path::normalize`] and reject `..` traversal.
pub trait StorageProvider: Send + Sync + 'static {
    // --- Read operations (required) ---

    /// Read the entire contents of a file at the given path.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Check whether a file exists at the given path.
    fn exists(&self, path: &str) -> Result<bool>;

    /// List the immediate children of a directory.
    ///
    /// Returns file and directory names (not full paths), sorted.
    /// Returns an empty vec for non-existent directories.
    fn list_dir(&self, path: &str) -> Result<Vec<String>>;

    // --- Read operations (provided) ---

    /// Read `len` bytes starting at `offset`.
    ///
    /// Fails with [`VfsError::OutOfRange`] if the range reaches past the end.
    fn read_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        let data = self.read(path)?;
        slice_range(path, &data, offset, len).map(<[u8]>::to_vec)
    }

    /// Size of the file in bytes.
    fn len(&self, path: &str) -> Result<u64> {
        Ok(self.read(path)?.len() as u64)
    }

    /// Resolved on-disk location of `path`, for providers that have one.
    fn absolute_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    // --- Write operations (optional, default returns ReadOnly) ---

    /// Whether this provider is read-only.
    ///
    /// Returns `true` by default. Providers that support writes should
    /// override this to return `false`.
    fn is_read_only(&self) -> bool {
        true
    }

    /// Write data to a file, creating or overwriting it.
    fn write(&self, _path: &str, _data: &[u8]) -> Result<()> {
        Err(VfsError::ReadOnly)
    }

    /// Append data to a file, creating it if missing.
    fn append(&self, _path: &str, _data: &[u8]) -> Result<()> {
        Err(VfsError::ReadOnly)
    }

    /// Delete a file at the given path.
    fn delete(&self, _path: &str) -> Result<()> {
        Err(VfsError::ReadOnly)
    }

    /// Create a directory at the given path.
    fn create_dir(&self, _path: &str) -> Result<()> {
        Err(VfsError::ReadOnly)
    }
}

/// Bounds-checked sub-slice used by ranged reads.
pub(crate) fn slice_range<'a>(path: &str, data: &'a [u8], offset: u64, len: u64) -> Result<&'a [u8]> {
    let size = data.len() as u64;
    let end = offset.checked_add(len).filter(|end| *end <= size);
    match end {
        Some(end) => Ok(&data[offset as usize..end as usize]),
        None => Err(VfsError::OutOfRange {
            path: path.to_owned(),
            offset,
            len,
            size,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Read-only provider serving one fixed file, to exercise the defaults.
    struct Fixed;

    impl StorageProvider for Fixed {
        fn read(&self, path: &str) -> Result<Vec<u8>> {
            match path {
                "fixed.bin" => Ok(vec![0, 1, 2, 3, 4, 5]),
                _ => Err(VfsError::NotFound(path.to_owned())),
            }
        }

        fn exists(&self, path: &str) -> Result<bool> {
            Ok(path == "fixed.bin")
        }

        fn list_dir(&self, _path: &str) -> Result<Vec<String>> {
            Ok(vec!["fixed.bin".to_owned()])
        }
    }

    #[test]
    fn default_read_range() {
        assert_eq!(Fixed.read_range("fixed.bin", 2, 3).unwrap(), vec![2, 3, 4]);
        assert_eq!(Fixed.read_range("fixed.bin", 6, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn default_read_range_out_of_bounds() {
        let err = Fixed.read_range("fixed.bin", 4, 3).unwrap_err();
        assert!(matches!(err, VfsError::OutOfRange { size: 6, .. }));
        assert!(Fixed.read_range("fixed.bin", u64::MAX, 2).is_err());
    }

    #[test]
    fn default_len() {
        assert_eq!(Fixed.len("fixed.bin").unwrap(), 6);
    }

    #[test]
    fn default_writes_are_read_only() {
        assert!(Fixed.is_read_only());
        assert!(matches!(Fixed.write("x", b"1"), Err(VfsError::ReadOnly)));
        assert!(matches!(Fixed.append("x", b"1"), Err(VfsError::ReadOnly)));
        assert!(matches!(Fixed.delete("fixed.bin"), Err(VfsError::ReadOnly)));
        assert!(matches!(Fixed.create_dir("d"), Err(VfsError::ReadOnly)));
        assert!(Fixed.absolute_path("fixed.bin").is_none());
    }
}
