//! The presentation: one talking-book document and everything it owns.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use talkbook_core::{Command, Editable, ListenerId, UndoRedoManager};
use talkbook_vfs::{MemoryProvider, StorageProvider};

use crate::channel::{Channel, ChannelUid, ChannelsManager};
use crate::cleanup::PoolMark;
use crate::config::{PresentationConfig, build_storage};
use crate::data_provider::{DataProviderPool, DataProviderUid};
use crate::error::{Error, Result};
use crate::events::{ChangeBus, ChangeEvent, ChangeKind};
use crate::media::Media;
use crate::media_data::{AudioClip, MediaData, MediaDataPool, MediaDataUid, PcmFormat, WavAudioMediaData};
use crate::property::{ChannelsProperty, Property, PropertyKind, PropertySet, check_media};
use crate::tree::{NodeId, Tree, TreeValidator};

/// Identity of a presentation within its [`Project`].
///
/// Embedded in every [`NodeId`] so that a node handle cannot be used with a
/// presentation that does not own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresentationId(u64);

impl PresentationId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PresentationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A pool entry a command can keep alive across cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetRef {
    MediaData(MediaDataUid),
    DataProvider(DataProviderUid),
}

impl Editable for Presentation {
    type AssetRef = AssetRef;
}

/// A talking-book document.
///
/// Owns the content tree, the channels, both asset pools, the undo/redo
/// history and the change bus. Every mutating method publishes the change
/// events it caused before returning.
pub struct Presentation {
    pub(crate) id: PresentationId,
    pub(crate) config: PresentationConfig,
    pub(crate) tree: Tree,
    pub(crate) channels: ChannelsManager,
    pub(crate) media_data: MediaDataPool,
    pub(crate) data_providers: DataProviderPool,
    pub(crate) history: UndoRedoManager<Presentation>,
    pub(crate) events: ChangeBus,
    pub(crate) pending: Vec<ChangeEvent>,
    /// One per open transaction, innermost last.
    transaction_marks: Vec<PoolMark>,
}

impl Presentation {
    /// A standalone presentation with the storage backend selected by `config`.
    ///
    /// Standalone presentations each come from a fresh [`Project`], so their
    /// ids coincide. Presentations that exchange nodes or subtrees should be
    /// created from one shared project instead.
    pub fn new(config: PresentationConfig) -> Self {
        Project::new().create_presentation(config)
    }

    /// A standalone in-memory presentation with default settings.
    pub fn in_memory() -> Self {
        Project::new().create_in_memory()
    }

    /// A standalone presentation over `storage`.
    pub fn with_storage(config: PresentationConfig, storage: Arc<dyn StorageProvider>) -> Self {
        Project::new().create_with_storage(config, storage)
    }

    fn with_id(id: PresentationId, config: PresentationConfig, storage: Arc<dyn StorageProvider>) -> Self {
        let history = match config.max_undo() {
            Some(limit) => UndoRedoManager::with_capacity_limit(limit),
            None => UndoRedoManager::new(),
        };
        let data_providers = DataProviderPool::new(storage, config.storage.data_dir.clone());
        log::debug!("created presentation {id} '{}'", config.presentation.name);
        Self {
            id,
            tree: Tree::new(id),
            channels: ChannelsManager::new(),
            media_data: MediaDataPool::new(),
            data_providers,
            history,
            events: ChangeBus::new(),
            pending: Vec::new(),
            transaction_marks: Vec::new(),
            config,
        }
    }

    pub fn id(&self) -> PresentationId {
        self.id
    }

    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn channels(&self) -> &ChannelsManager {
        &self.channels
    }

    pub fn media_data(&self) -> &MediaDataPool {
        &self.media_data
    }

    pub fn data_providers(&self) -> &DataProviderPool {
        &self.data_providers
    }

    pub fn history(&self) -> &UndoRedoManager<Presentation> {
        &self.history
    }

    /// Publishes everything queued since the last flush.
    pub(crate) fn flush(&mut self) {
        let mut events = self.tree.drain_events();
        events.append(&mut self.pending);
        for event in &events {
            self.events.publish(event);
        }
    }

    // --- Events ---

    pub fn subscribe(
        &mut self,
        kind: ChangeKind,
        handler: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.subscribe(kind, handler)
    }

    /// Listens for `kind` events about `node` only.
    pub fn subscribe_local(
        &mut self,
        node: NodeId,
        kind: ChangeKind,
        handler: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.subscribe_local(node, kind, handler)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn events(&self) -> &ChangeBus {
        &self.events
    }

    // --- Tree ---

    pub fn create_node(&mut self) -> NodeId {
        self.tree.create_node()
    }

    pub fn set_validator(&mut self, validator: Option<Box<dyn TreeValidator>>) {
        self.tree.set_validator(validator);
    }

    pub fn insert(&mut self, parent: NodeId, node: NodeId, index: usize) -> Result<()> {
        let result = self.tree.insert(parent, node, index);
        self.flush();
        result
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        let result = self.tree.append_child(parent, node);
        self.flush();
        result
    }

    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let result = self.tree.insert_before(anchor, node);
        self.flush();
        result
    }

    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<()> {
        let result = self.tree.insert_after(anchor, node);
        self.flush();
        result
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize> {
        let result = self.tree.remove_child(parent, child);
        self.flush();
        result
    }

    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let result = self.tree.remove_child_at(parent, index);
        self.flush();
        result
    }

    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<usize> {
        let result = self.tree.replace_child(parent, new, old);
        self.flush();
        result
    }

    pub fn replace_child_at(&mut self, parent: NodeId, new: NodeId, index: usize) -> Result<NodeId> {
        let result = self.tree.replace_child_at(parent, new, index);
        self.flush();
        result
    }

    pub fn detach(&mut self, node: NodeId) -> Result<(NodeId, usize)> {
        let result = self.tree.detach(node);
        self.flush();
        result
    }

    pub fn destroy_detached(&mut self, node: NodeId) -> Result<usize> {
        self.tree.destroy_detached(node)
    }

    // --- Properties ---

    /// Attaches `property` to `node`, replacing one of the same kind.
    ///
    /// A channels property must map only registered channels, each to media
    /// its channel accepts, and managed media must be in this presentation's
    /// pool.
    pub fn add_property(&mut self, node: NodeId, property: Property) -> Result<Option<Property>> {
        self.check_property(&property)?;
        let result = self.tree.add_property(node, property);
        self.flush();
        result
    }

    pub fn remove_property(&mut self, node: NodeId, kind: PropertyKind) -> Result<Option<Property>> {
        let result = self.tree.remove_property(node, kind);
        self.flush();
        result
    }

    pub fn media(&self, node: NodeId, channel: ChannelUid) -> Result<Option<&Media>> {
        self.tree.media(node, channel)
    }

    /// Maps `media` on `channel` at `node`.
    ///
    /// Managed media must reference media data in this presentation's pool.
    pub fn set_media(&mut self, node: NodeId, channel: ChannelUid, media: Media) -> Result<Option<Media>> {
        self.check_managed(&media)?;
        let result = self.tree.set_media(node, &self.channels, channel, media);
        self.flush();
        result
    }

    pub fn clear_media(&mut self, node: NodeId, channel: ChannelUid) -> Result<Option<Media>> {
        let result = self.tree.clear_media(node, channel);
        self.flush();
        result
    }

    fn check_managed(&self, media: &Media) -> Result<()> {
        match media.media_data() {
            Some(uid) if !self.media_data.contains(uid) => Err(Error::not_managed("media data", uid.raw())),
            _ => Ok(()),
        }
    }

    fn check_property(&self, property: &Property) -> Result<()> {
        let Some(channels) = property.as_channels() else {
            return Ok(());
        };
        for (channel, media) in channels.iter() {
            check_media(&self.channels, channel, media)?;
            self.check_managed(media)?;
        }
        Ok(())
    }

    // --- Channels ---

    pub fn add_channel(&mut self, channel: Channel) -> ChannelUid {
        log::debug!("adding channel '{}' ({:?})", channel.name(), channel.kind());
        let uid = self.channels.add(channel);
        self.pending.push(ChangeEvent::ChannelAdded { channel: uid });
        self.flush();
        uid
    }

    /// Removes a channel and every mapping on it, attached or detached.
    pub fn remove_channel(&mut self, uid: ChannelUid) -> Result<Channel> {
        self.channels.require(uid)?;
        let touched = self.tree.clear_channel_everywhere(uid);
        let channel = self.channels.remove(uid)?;
        log::debug!(
            "removed channel '{}', cleared {} mapping(s)",
            channel.name(),
            touched.len()
        );
        self.pending.push(ChangeEvent::ChannelRemoved { channel: uid });
        self.flush();
        Ok(channel)
    }

    // --- Media data ---

    pub fn manage_media_data(&mut self, media_data: Box<dyn MediaData>) -> MediaDataUid {
        let uid = self.media_data.manage(media_data);
        self.pending.push(ChangeEvent::MediaDataAdded { uid });
        self.flush();
        uid
    }

    /// Removes an entry from the pool. Its data providers stay until cleanup.
    pub fn unmanage_media_data(&mut self, uid: MediaDataUid) -> Result<Box<dyn MediaData>> {
        let media_data = self.media_data.unmanage(uid)?;
        self.pending.push(ChangeEvent::MediaDataRemoved { uid });
        self.flush();
        Ok(media_data)
    }

    /// Creates empty audio media data in the configured PCM format.
    pub fn create_audio_media_data(&mut self) -> Result<MediaDataUid> {
        let format = self.config.audio.pcm_format()?;
        Ok(self.create_audio_media_data_with_format(format))
    }

    pub fn create_audio_media_data_with_format(&mut self, format: PcmFormat) -> MediaDataUid {
        self.manage_media_data(Box::new(WavAudioMediaData::new(format)))
    }

    /// Appends raw PCM frames to audio media data, in a fresh data provider.
    pub fn append_audio_data(&mut self, uid: MediaDataUid, pcm: &[u8]) -> Result<AudioClip> {
        let audio = self.media_data.get_as_mut::<WavAudioMediaData>(uid)?;
        audio.append_pcm(&mut self.data_providers, pcm)
    }

    pub fn read_audio_data(&self, uid: MediaDataUid) -> Result<Vec<u8>> {
        self.media_data
            .get_as::<WavAudioMediaData>(uid)?
            .read_pcm(&self.data_providers)
    }

    /// Duplicates a media data entry. The copy shares data providers.
    pub fn copy_media_data(&mut self, uid: MediaDataUid) -> Result<MediaDataUid> {
        let copy = self
            .media_data
            .get(uid)
            .ok_or(Error::not_managed("media data", uid.raw()))?
            .boxed_copy();
        Ok(self.manage_media_data(copy))
    }

    /// Splits audio media data at `at`; the tail becomes a new entry.
    pub fn split_media_data(&mut self, uid: MediaDataUid, at: Duration) -> Result<MediaDataUid> {
        let tail = self.media_data.get_as_mut::<WavAudioMediaData>(uid)?.split(at)?;
        Ok(self.manage_media_data(Box::new(tail)))
    }

    /// Moves the audio of `from` onto the end of `into`.
    ///
    /// `from` stays in the pool, empty, so nodes and history commands that
    /// still map it remain valid. Cleanup removes it once nothing does.
    pub fn merge_media_data(&mut self, into: MediaDataUid, from: MediaDataUid) -> Result<()> {
        if into == from {
            return Err(Error::InvalidArgument("cannot merge media data with itself".into()));
        }
        let other = self.media_data.get_as::<WavAudioMediaData>(from)?.clone();
        self.media_data.get_as_mut::<WavAudioMediaData>(into)?.merge(&other)?;
        self.media_data.get_as_mut::<WavAudioMediaData>(from)?.clear();
        log::debug!("merged media data {from} into {into}");
        Ok(())
    }

    /// Playback length of `media`.
    ///
    /// Managed audio reports its media data's duration; other continuous
    /// media its clip length; discrete media zero.
    pub fn media_duration(&self, media: &Media) -> Result<Duration> {
        match media.media_data() {
            Some(uid) => Ok(self
                .media_data
                .get(uid)
                .ok_or(Error::not_managed("media data", uid.raw()))?
                .duration()),
            None => Ok(media
                .as_continuous()
                .map_or(Duration::ZERO, |continuous| continuous.duration())),
        }
    }

    /// Media data referenced from `node` and its descendants, attached or not.
    pub fn subtree_media_data(&self, node: NodeId) -> Result<Vec<MediaDataUid>> {
        let mut uids = Vec::new();
        for id in self.tree.subtree(node)? {
            uids.extend(self.tree.properties(id)?.media_data_uids());
        }
        uids.sort();
        uids.dedup();
        Ok(uids)
    }

    /// [`subtree_media_data`](Self::subtree_media_data) as asset references,
    /// for commands holding a detached subtree.
    pub fn subtree_assets(&self, node: NodeId) -> Vec<AssetRef> {
        self.subtree_media_data(node)
            .map(|uids| uids.into_iter().map(AssetRef::MediaData).collect())
            .unwrap_or_default()
    }

    // --- Subtree copy ---

    /// Deep-copies `node`'s subtree into a new detached subtree.
    ///
    /// Each distinct managed media data is duplicated once; the duplicates
    /// share data providers with the originals.
    pub fn copy_subtree(&mut self, node: NodeId) -> Result<NodeId> {
        let mut snapshot = self.tree.snapshot(node)?;
        let mut copies: HashMap<MediaDataUid, MediaDataUid> = HashMap::new();
        snapshot.try_for_each_properties(&mut |properties: &mut PropertySet| {
            let Some(channels) = properties.channels_mut() else {
                return Ok(());
            };
            for (_, media) in channels.iter_mut() {
                let Some(uid) = media.media_data() else {
                    continue;
                };
                let copy = match copies.get(&uid) {
                    Some(copy) => *copy,
                    None => {
                        let copy = self.copy_media_data(uid)?;
                        copies.insert(uid, copy);
                        copy
                    }
                };
                *media = media.with_media_data(copy);
            }
            Ok(())
        })?;
        Ok(self.tree.instantiate(snapshot))
    }

    /// Deep-copies `node`'s subtree into `other` as a detached subtree.
    ///
    /// Channels are matched by name and kind and created in `other` when
    /// missing. Audio media data is rebuilt in `other`'s pools from a byte
    /// copy of its PCM.
    pub fn export_subtree(&self, node: NodeId, other: &mut Presentation) -> Result<NodeId> {
        let mut snapshot = self.tree.snapshot(node)?;
        let mut channel_map: HashMap<ChannelUid, ChannelUid> = HashMap::new();
        let mut media_map: HashMap<MediaDataUid, MediaDataUid> = HashMap::new();

        snapshot.try_for_each_properties(&mut |properties: &mut PropertySet| {
            let Some(source) = properties.channels() else {
                return Ok(());
            };
            let mut exported = ChannelsProperty::new();
            for (channel, media) in source.iter() {
                let target_channel = match channel_map.get(&channel) {
                    Some(uid) => *uid,
                    None => {
                        let uid = other.import_channel(self.channels.require(channel)?);
                        channel_map.insert(channel, uid);
                        uid
                    }
                };
                let media = match media.media_data() {
                    None => media.clone(),
                    Some(uid) => {
                        let target = match media_map.get(&uid) {
                            Some(target) => *target,
                            None => {
                                let target = self.export_media_data(uid, other)?;
                                media_map.insert(uid, target);
                                target
                            }
                        };
                        media.with_media_data(target)
                    }
                };
                exported.set_media(&other.channels, target_channel, media)?;
            }
            properties.insert(exported.into());
            Ok(())
        })?;

        let exported = other.tree.instantiate(snapshot);
        log::debug!("exported subtree {node} to {exported}");
        other.flush();
        Ok(exported)
    }

    /// The channel in `self` with the same name and kind, created if missing.
    fn import_channel(&mut self, channel: &Channel) -> ChannelUid {
        let existing = self
            .channels
            .iter()
            .find(|(_, c)| c.name() == channel.name() && c.kind() == channel.kind())
            .map(|(uid, _)| uid);
        match existing {
            Some(uid) => uid,
            None => self.add_channel(channel.clone()),
        }
    }

    fn export_media_data(&self, uid: MediaDataUid, other: &mut Presentation) -> Result<MediaDataUid> {
        let source = self.media_data.get_as::<WavAudioMediaData>(uid)?;
        let pcm = source.read_pcm(&self.data_providers)?;
        let mut copy = WavAudioMediaData::new(source.format());
        if !pcm.is_empty() {
            copy.append_pcm(&mut other.data_providers, &pcm)?;
        }
        Ok(other.manage_media_data(Box::new(copy)))
    }

    // --- History ---

    /// Runs `command` through the undo/redo history.
    pub fn execute(&mut self, command: impl Command<Presentation> + 'static) -> Result<()> {
        let description = command.description().to_owned();
        let mut history = std::mem::take(&mut self.history);
        let result = history.execute(Box::new(command), self);
        self.history = history;
        if result.is_ok() {
            self.pending.push(ChangeEvent::CommandDone { description });
        }
        self.flush();
        Ok(result?)
    }

    pub fn undo(&mut self) -> Result<()> {
        let description = self.history.undo_descriptions().next().map(str::to_owned);
        let mut history = std::mem::take(&mut self.history);
        let result = history.undo(self);
        self.history = history;
        if result.is_ok()
            && let Some(description) = description
        {
            self.pending.push(ChangeEvent::CommandUndone { description });
        }
        self.flush();
        Ok(result?)
    }

    pub fn redo(&mut self) -> Result<()> {
        let description = self.history.redo_descriptions().next().map(str::to_owned);
        let mut history = std::mem::take(&mut self.history);
        let result = history.redo(self);
        self.history = history;
        if result.is_ok()
            && let Some(description) = description
        {
            self.pending.push(ChangeEvent::CommandRedone { description });
        }
        self.flush();
        Ok(result?)
    }

    pub fn start_transaction(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.history.start_transaction(description.clone());
        self.transaction_marks.push(self.pool_mark());
        self.pending.push(ChangeEvent::TransactionStarted { description });
        self.flush();
    }

    /// Closes the innermost transaction. Returns `false` if it was empty.
    pub fn end_transaction(&mut self) -> Result<bool> {
        let committed = self.history.end_transaction()?;
        self.transaction_marks.pop();
        self.pending.push(ChangeEvent::TransactionEnded { committed });
        self.flush();
        Ok(committed)
    }

    /// Reverts everything done in the innermost transaction.
    ///
    /// Pool entries created inside the transaction that nothing references
    /// any more are removed, so the pools also return to their prior state.
    pub fn cancel_transaction(&mut self) -> Result<()> {
        let mut history = std::mem::take(&mut self.history);
        let result = history.cancel_transaction(self);
        self.history = history;
        let mark = self.transaction_marks.pop();
        if let Err(err) = result {
            self.flush();
            return Err(err.into());
        }

        if let Some(mark) = mark {
            self.sweep_created_since(mark);
        }
        self.pending.push(ChangeEvent::TransactionCancelled);
        self.flush();
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    /// Forgets both sides of the history. Assets only they referenced
    /// become collectable.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// The scope in which presentation ids are handed out.
///
/// Every presentation created through the same project gets a distinct
/// [`PresentationId`], so node handles of one are rejected by the others.
#[derive(Debug)]
pub struct Project {
    next_id: u64,
}

impl Project {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    fn next_id(&mut self) -> PresentationId {
        let id = PresentationId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Creates a presentation with the storage backend selected by `config`.
    pub fn create_presentation(&mut self, config: PresentationConfig) -> Presentation {
        let storage = build_storage(&config);
        self.create_with_storage(config, storage)
    }

    /// Creates an in-memory presentation with default settings.
    pub fn create_in_memory(&mut self) -> Presentation {
        self.create_with_storage(PresentationConfig::default(), Arc::new(MemoryProvider::new()))
    }

    pub fn create_with_storage(
        &mut self,
        config: PresentationConfig,
        storage: Arc<dyn StorageProvider>,
    ) -> Presentation {
        Presentation::with_id(self.next_id(), config, storage)
    }

    /// Number of presentations created so far.
    pub fn presentation_count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presentation")
            .field("id", &self.id)
            .field("name", &self.config.presentation.name)
            .field("tree", &self.tree)
            .field("channels", &self.channels.len())
            .field("media_data", &self.media_data)
            .field("data_providers", &self.data_providers)
            .field("history", &self.history)
            .finish()
    }
}
