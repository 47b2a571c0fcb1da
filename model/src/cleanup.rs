//! Mark-and-sweep collection of unreferenced pool entries.
//!
//! Roots are the media mapped by nodes reachable from the tree root and the
//! assets reported by every command in the history (both sides of the cursor
//! and any open transaction). Data providers are reachable through the media
//! data that uses them or when a command pins them directly.

use std::collections::BTreeSet;
use std::fmt;

use crate::data_provider::DataProviderUid;
use crate::events::ChangeEvent;
use crate::media_data::MediaDataUid;
use crate::presentation::{AssetRef, Presentation};

/// The marked set of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachableAssets {
    pub media_data: BTreeSet<MediaDataUid>,
    pub data_providers: BTreeSet<DataProviderUid>,
}

/// A data provider whose blob could not be deleted.
///
/// The provider is unmanaged regardless; its file is left behind.
#[derive(Debug)]
pub struct FailedDeletion {
    pub uid: DataProviderUid,
    pub path: String,
    pub error: crate::Error,
}

/// What a cleanup pass removed.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed_media_data: Vec<MediaDataUid>,
    pub removed_data_providers: Vec<DataProviderUid>,
    pub failed_deletions: Vec<FailedDeletion>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.removed_media_data.is_empty() && self.removed_data_providers.is_empty()
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} media data, {} data providers ({} failed deletions)",
            self.removed_media_data.len(),
            self.removed_data_providers.len(),
            self.failed_deletions.len()
        )
    }
}

impl Presentation {
    /// Computes the assets a cleanup pass would keep.
    pub fn reachable_assets(&self) -> ReachableAssets {
        let mut reachable = ReachableAssets::default();

        let root = self.tree.root();
        let attached = std::iter::once(root).chain(self.tree.descendants(root).into_iter().flatten());
        for node in attached {
            if let Ok(properties) = self.tree.properties(node) {
                reachable.media_data.extend(properties.media_data_uids());
            }
        }

        for asset in self.history.used_assets(self) {
            match asset {
                AssetRef::MediaData(uid) => {
                    reachable.media_data.insert(uid);
                }
                AssetRef::DataProvider(uid) => {
                    reachable.data_providers.insert(uid);
                }
            }
        }

        for uid in &reachable.media_data {
            if let Some(media_data) = self.media_data.get(*uid) {
                reachable.data_providers.extend(media_data.used_data_providers());
            }
        }
        reachable
    }

    /// Removes every media data and data provider nothing refers to, and
    /// deletes the removed providers' blobs.
    ///
    /// A blob that cannot be deleted is logged and reported; the pass goes on.
    pub fn cleanup(&mut self) -> CleanupReport {
        let report = self.sweep(None);
        log::info!("cleanup: {report}");
        report
    }

    pub(crate) fn pool_mark(&self) -> PoolMark {
        PoolMark {
            media_data: self.media_data.next_uid(),
            data_providers: self.data_providers.next_uid(),
        }
    }

    /// Sweeps unreachable entries created at or after `mark` only.
    pub(crate) fn sweep_created_since(&mut self, mark: PoolMark) -> CleanupReport {
        let report = self.sweep(Some(mark));
        if !report.is_empty() {
            log::debug!("discarded assets of cancelled transaction: {report}");
        }
        report
    }

    fn sweep(&mut self, since: Option<PoolMark>) -> CleanupReport {
        let reachable = self.reachable_assets();
        let mut report = CleanupReport::default();

        let doomed: Vec<MediaDataUid> = self
            .media_data
            .uids()
            .filter(|uid| !reachable.media_data.contains(uid))
            .filter(|uid| since.is_none_or(|mark| *uid >= mark.media_data))
            .collect();
        for uid in doomed {
            if self.media_data.unmanage(uid).is_ok() {
                self.pending.push(ChangeEvent::MediaDataRemoved { uid });
                report.removed_media_data.push(uid);
            }
        }

        let doomed: Vec<DataProviderUid> = self
            .data_providers
            .uids()
            .filter(|uid| !reachable.data_providers.contains(uid))
            .filter(|uid| since.is_none_or(|mark| *uid >= mark.data_providers))
            .collect();
        for uid in doomed {
            let Ok(provider) = self.data_providers.unmanage(uid) else {
                continue;
            };
            self.pending.push(ChangeEvent::DataProviderRemoved { uid });
            report.removed_data_providers.push(uid);
            if let Err(error) = self.data_providers.delete_blob(&provider) {
                log::warn!(
                    "failed to delete blob '{}' of data provider {uid}: {error}",
                    provider.relative_path()
                );
                report.failed_deletions.push(FailedDeletion {
                    uid,
                    path: provider.relative_path().to_owned(),
                    error,
                });
            }
        }

        self.flush();
        report
    }
}

/// Pool UID watermarks taken when a transaction starts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PoolMark {
    media_data: MediaDataUid,
    data_providers: DataProviderUid,
}
