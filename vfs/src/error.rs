/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    /// The requested path was not found in the provider.
    #[error("not found: {0}")]
    NotFound(String),
    /// An IO error occurred while accessing a provider.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    /// The path is invalid (empty, contains `..`, or other normalization failure).
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// The provider does not support write operations.
    #[error("provider is read-only")]
    ReadOnly,
    /// A ranged read reached past the end of the stored data.
    #[error("range {offset}+{len} out of bounds for '{path}' ({size} bytes)")]
    OutOfRange {
        path: String,
        offset: u64,
        len: u64,
        size: u64,
    },
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            VfsError::NotFound(err.to_string())
        } else {
            VfsError::Io(err)
        }
    }
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, VfsError>;
