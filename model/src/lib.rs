//! # Talkbook Model
//!
//! The document model of a talking book: a content tree whose nodes carry
//! text, audio and other media on named channels, backed by pools of shared
//! media data and byte storage.
//!
//! - [`Presentation`]: owns everything below and is the entry point for edits
//! - [`tree`]: the arena-backed content tree, validation and traversal
//! - [`channel`], [`media`], [`property`]: what nodes carry
//! - [`media_data`], [`data_provider`]: the asset pools
//! - [`commands`]: reversible edits for the undo/redo history
//! - [`cleanup`]: mark-and-sweep over the pools
//! - [`events`]: change notifications
//!
//! # Example
//!
//! ```
//! use talkbook_model::{Channel, ChannelKind, Media, Presentation};
//! use talkbook_model::commands::{InsertNodeCommand, SetMediaCommand};
//!
//! let mut book = Presentation::in_memory();
//! let text = book.add_channel(Channel::new("text", ChannelKind::Text)?);
//!
//! let heading = book.create_node();
//! book.execute(InsertNodeCommand::new(book.root(), heading, 0))?;
//! book.execute(SetMediaCommand::new(heading, text, Media::text("Chapter 1")))?;
//!
//! book.undo()?;
//! assert_eq!(book.media(heading, text)?, None);
//! # Ok::<(), talkbook_model::Error>(())
//! ```

pub mod channel;
pub mod cleanup;
pub mod commands;
pub mod config;
pub mod data_provider;
mod error;
pub mod events;
pub mod media;
pub mod media_data;
pub mod presentation;
pub mod property;
pub mod tree;

pub use channel::{Channel, ChannelKind, ChannelUid, ChannelsManager};
pub use cleanup::{CleanupReport, FailedDeletion, ReachableAssets};
pub use config::{PresentationConfig, load_config};
pub use data_provider::{DataProvider, DataProviderPool, DataProviderUid};
pub use error::{Error, Result};
pub use events::{ChangeEvent, ChangeKind};
pub use media::{Media, MediaKind};
pub use media_data::{MediaData, MediaDataPool, MediaDataUid, PcmFormat, WavAudioMediaData};
pub use presentation::{AssetRef, Presentation, PresentationId, Project};
pub use property::{ChannelsProperty, Property, PropertyKind, XmlProperty};
pub use tree::{NodeId, Tree, TreeValidator, TreeVisitor, VisitFlow, VisitOutcome};
