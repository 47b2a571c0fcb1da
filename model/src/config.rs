//! Presentation configuration loaded from TOML.
//!
//! ```toml
//! [presentation]
//! name = "My book"
//! language = "en"
//!
//! [storage]
//! kind = "filesystem"
//! root = "book"
//! data_dir = "data"
//!
//! [history]
//! max_undo = 0
//!
//! [audio]
//! channels = 1
//! sample_rate = 22050
//! bit_depth = 16
//! ```
//!
//! Every section and field is optional.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use talkbook_vfs::{FileSystemProvider, MemoryProvider, StorageProvider};

use crate::error::{Error, Result};
use crate::media_data::PcmFormat;

/// Top-level configuration of one presentation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub presentation: PresentationInfo,
    pub storage: StorageConfig,
    pub history: HistoryConfig,
    pub audio: AudioConfig,
}

/// General document information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PresentationInfo {
    pub name: String,
    pub language: Option<String>,
}

impl Default for PresentationInfo {
    fn default() -> Self {
        Self {
            name: "Untitled".into(),
            language: None,
        }
    }
}

/// Where data provider bytes live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Filesystem,
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Root directory of a filesystem backend. Ignored for memory storage.
    pub root: String,
    /// Base directory of the data provider pool, relative to the root.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            root: ".".into(),
            data_dir: "data".into(),
        }
    }
}

/// Undo/redo history settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo entries; `0` means unbounded.
    pub max_undo: usize,
}

/// Default PCM format for new audio media data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44_100,
            bit_depth: 16,
        }
    }
}

impl AudioConfig {
    /// Validated PCM format.
    pub fn pcm_format(&self) -> Result<PcmFormat> {
        PcmFormat::new(self.channels, self.sample_rate, self.bit_depth)
    }
}

impl PresentationConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.audio.pcm_format()?;
        Ok(config)
    }

    /// The undo capacity, `None` if unbounded.
    pub fn max_undo(&self) -> Option<usize> {
        match self.history.max_undo {
            0 => None,
            n => Some(n),
        }
    }
}

/// Load a config from a TOML file.
pub fn load_config(path: &Path) -> Result<PresentationConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    let config = PresentationConfig::from_toml_str(&content)?;
    log::info!(
        "loaded presentation config '{}' from {}",
        config.presentation.name,
        path.display()
    );
    Ok(config)
}

/// Build the storage backend selected by `config`.
pub fn build_storage(config: &PresentationConfig) -> Arc<dyn StorageProvider> {
    match config.storage.kind {
        StorageKind::Memory => {
            log::info!("storage: memory");
            Arc::new(MemoryProvider::new())
        }
        StorageKind::Filesystem => {
            log::info!("storage: filesystem {:?}", config.storage.root);
            Arc::new(FileSystemProvider::new(&config.storage.root))
        }
    }
}
