//! Byte storage for talkbook data providers.
//!
//! Every data provider in a presentation is a file-like blob addressed by a
//! relative path. This crate supplies the backends those blobs live in,
//! through the [`StorageProvider`] trait.
//!
//! # Providers
//!
//! - [`MemoryProvider`]: in-memory storage for tests and scratch documents
//! - [`FileSystemProvider`]: native filesystem access under a root directory
//!
//! # Read-Only vs Read-Write
//!
//! All providers must implement read operations. Write operations are optional
//! and default to returning [`VfsError::ReadOnly`]. Use
//! [`StorageProvider::is_read_only()`] to check capability.
//!
//! # Paths
//!
//! Providers accept any relative path and normalize it with
//! [`path::normalize`] before touching storage, so `..` traversal is
//! rejected uniformly.

mod error;
#[cfg(feature = "filesystem")]
mod filesystem;
mod memory;
pub mod path;
mod provider;

pub use error::{Result, VfsError};
#[cfg(feature = "filesystem")]
pub use filesystem::FileSystemProvider;
pub use memory::MemoryProvider;
pub use provider::StorageProvider;
