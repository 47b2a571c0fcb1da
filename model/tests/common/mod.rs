//! Shared fixtures for the model integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use talkbook_model::{Channel, ChannelKind, ChannelUid, MediaDataUid, NodeId, Presentation};
use talkbook_vfs::{MemoryProvider, StorageProvider, VfsError};

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A presentation with one text channel and one managed-audio channel.
pub struct Book {
    pub presentation: Presentation,
    pub text: ChannelUid,
    pub audio: ChannelUid,
}

impl Book {
    pub fn new() -> Self {
        Self::with_presentation(Presentation::in_memory())
    }

    pub fn with_presentation(mut presentation: Presentation) -> Self {
        init_logging();
        let text = presentation.add_channel(Channel::new("text", ChannelKind::Text).unwrap());
        let audio = presentation.add_channel(Channel::new("audio", ChannelKind::ManagedAudio).unwrap());
        Self {
            presentation,
            text,
            audio,
        }
    }

    pub fn root(&self) -> NodeId {
        self.presentation.root()
    }

    /// Creates a node and appends it under `parent` outside the history.
    pub fn append(&mut self, parent: NodeId) -> NodeId {
        let node = self.presentation.create_node();
        self.presentation.append_child(parent, node).unwrap();
        node
    }

    /// Creates audio media data holding `frames` mono 16-bit frames.
    pub fn audio_clip(&mut self, frames: usize) -> MediaDataUid {
        let uid = self.presentation.create_audio_media_data().unwrap();
        self.presentation.append_audio_data(uid, &pcm(frames)).unwrap();
        uid
    }
}

/// Deterministic 16-bit mono PCM.
pub fn pcm(frames: usize) -> Vec<u8> {
    (0..frames * 2).map(|i| (i * 7 % 256) as u8).collect()
}

/// Tiny deterministic generator for randomized sequences.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound.max(1) as u64) as usize
    }
}

/// Storage whose deletes always fail; everything else goes to memory.
#[derive(Clone, Default)]
pub struct UndeletableStorage {
    pub inner: MemoryProvider,
}

impl StorageProvider for UndeletableStorage {
    fn read(&self, path: &str) -> talkbook_vfs::Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn exists(&self, path: &str) -> talkbook_vfs::Result<bool> {
        self.inner.exists(path)
    }

    fn list_dir(&self, path: &str) -> talkbook_vfs::Result<Vec<String>> {
        self.inner.list_dir(path)
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, path: &str, data: &[u8]) -> talkbook_vfs::Result<()> {
        self.inner.write(path, data)
    }

    fn append(&self, path: &str, data: &[u8]) -> talkbook_vfs::Result<()> {
        self.inner.append(path, data)
    }

    fn delete(&self, path: &str) -> talkbook_vfs::Result<()> {
        Err(VfsError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("refusing to delete {path}"),
        )))
    }
}

impl UndeletableStorage {
    pub fn shared(&self) -> Arc<dyn StorageProvider> {
        Arc::new(self.clone())
    }
}
