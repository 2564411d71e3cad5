//! Sync orchestration
//!
//! Runs one sync cycle per `(data type, library)`:
//!
//! ```text
//! Idle -> Fetching -> Merging -> Done
//!             \          \
//!              +----------+----> Failed
//! ```
//!
//! The cached snapshot is only written on `Merging -> Done`; a failed cycle
//! leaves it untouched and the next cycle retries from the same version.
//! Callers must not run overlapping cycles for the same key.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::fetcher::{needs_reconciliation, DeletionReconciler, VersionedFetcher};
use super::merge::merge;
use crate::client::LibraryClient;
use crate::error::{SyncError, SyncResult};
use crate::models::{
    DataType, DeletedKeys, Library, LibraryRecord, LibrarySnapshot, RecordType, Tag, TagSnapshot,
};
use crate::storage::{CacheKey, DurableCache};
use crate::tags::{
    build_tag_map, match_roam_pages, suggest_all, tokenize, AnnotationIndex, BucketSuggestions,
    TagMap,
};

/// Maximum number of tags per delete request
pub const TAG_DELETE_BATCH: usize = 50;

/// Phase of a sync cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    /// No cycle running
    Idle,
    /// Reading the delta and tombstones
    Fetching,
    /// Merging the delta into the cached snapshot
    Merging,
    /// Snapshot committed
    Done,
    /// Cycle aborted, snapshot untouched
    Failed,
}

/// What changed in a successful cycle
#[derive(Debug, Clone, PartialEq)]
pub enum SyncDelta {
    Records {
        modified: Vec<LibraryRecord>,
        deleted: Vec<String>,
    },
    Tags(Vec<Tag>),
}

/// Result of one cycle, as published to observers
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub data_type: DataType,
    pub library_path: String,
    pub success: bool,
    /// Version committed by the cycle
    pub version: Option<u64>,
    pub data: Option<SyncDelta>,
    pub error: Option<String>,
}

/// Events published while syncing
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A cycle moved to another phase
    PhaseChanged {
        data_type: DataType,
        library_path: String,
        phase: SyncPhase,
    },
    /// A cycle finished
    Completed(SyncOutcome),
}

/// Snapshots produced by a full library sync
#[derive(Debug, Clone, PartialEq)]
pub struct LibrarySync {
    pub items: LibrarySnapshot,
    pub collections: LibrarySnapshot,
    pub tags: TagSnapshot,
}

/// Coordinates fetch, reconciliation, merge and persistence
pub struct Syncer {
    client: Arc<dyn LibraryClient>,
    cache: Arc<dyn DurableCache>,
    fetcher: VersionedFetcher,
    reconciler: DeletionReconciler,
    observers: Mutex<Vec<mpsc::UnboundedSender<SyncEvent>>>,
}

impl Syncer {
    pub fn new(client: Arc<dyn LibraryClient>, cache: Arc<dyn DurableCache>) -> Self {
        Self {
            fetcher: VersionedFetcher::new(client.clone()),
            reconciler: DeletionReconciler::new(client.clone()),
            client,
            cache,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Register an observer
    ///
    /// Events are fire-and-forget: nothing is replayed to late subscribers,
    /// and a dropped receiver is unregistered on the next event.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(tx);
        }
        rx
    }

    // ==================== Cached state ====================

    /// Last committed snapshot of a record type, without network access
    pub fn cached(
        &self,
        library: &Library,
        record_type: RecordType,
    ) -> SyncResult<Option<LibrarySnapshot>> {
        self.load(&CacheKey::new(record_type.into(), library))
    }

    /// Last committed tag snapshot, without network access
    pub fn cached_tags(&self, library: &Library) -> SyncResult<Option<TagSnapshot>> {
        self.load(&CacheKey::new(DataType::Tags, library))
    }

    // ==================== Sync cycles ====================

    /// Bring the cached items or collections of a library up to date
    pub async fn sync_records(
        &self,
        library: &Library,
        record_type: RecordType,
    ) -> SyncResult<LibrarySnapshot> {
        let data_type = DataType::from(record_type);
        let key = CacheKey::new(data_type, library);
        self.set_phase(library, data_type, SyncPhase::Fetching);

        let previous: LibrarySnapshot = match self.load(&key) {
            Ok(previous) => previous.unwrap_or_default(),
            Err(e) => return self.finish(library, data_type, 0, Err(e)),
        };
        let since = previous.last_updated;
        info!("Syncing {} of {} since version {}", data_type, library, since);

        let result = self.records_cycle(library, record_type, &key, previous).await;
        self.finish(library, data_type, since, result)
    }

    async fn records_cycle(
        &self,
        library: &Library,
        record_type: RecordType,
        key: &CacheKey,
        previous: LibrarySnapshot,
    ) -> SyncResult<(LibrarySnapshot, SyncDelta)> {
        let data_type = DataType::from(record_type);
        let since = previous.last_updated;

        let fetched = self.fetcher.fetch(library, data_type, since).await?;
        let modified = fetched
            .records
            .into_iter()
            .map(serde_json::from_value::<LibraryRecord>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SyncError::decode(format!("{} of {}", data_type, library), e))?;

        let deleted = if needs_reconciliation(since, modified.len(), fetched.remote_version) {
            self.reconciler.fetch_deleted(library, since).await?
        } else {
            debug!("Skipping deletion check for {} of {}", data_type, library);
            DeletedKeys::default()
        };
        let deleted = record_type.deleted_keys(&deleted).to_vec();

        if record_type == RecordType::Items {
            self.refresh_tags_if_stale(library, fetched.remote_version)
                .await;
        }

        self.set_phase(library, data_type, SyncPhase::Merging);

        let newest_record = modified.iter().map(|r| r.version).max().unwrap_or(0);
        let last_updated = since.max(fetched.remote_version).max(newest_record);
        let delta = SyncDelta::Records {
            modified: modified.clone(),
            deleted: deleted.clone(),
        };

        let snapshot = LibrarySnapshot {
            data: merge(previous.data, modified, &deleted),
            last_updated,
            fetched_at: Some(Utc::now()),
        };
        self.commit(key, &snapshot)?;

        info!(
            "Synced {} of {}: {} records at version {}",
            data_type,
            library,
            snapshot.len(),
            last_updated
        );
        Ok((snapshot, delta))
    }

    /// Refetch the full tag list of a library
    pub async fn sync_tags(&self, library: &Library) -> SyncResult<TagSnapshot> {
        let key = CacheKey::new(DataType::Tags, library);
        self.set_phase(library, DataType::Tags, SyncPhase::Fetching);

        let since = match self.load::<TagSnapshot>(&key) {
            Ok(previous) => previous.map_or(0, |s| s.last_updated),
            Err(e) => return self.finish(library, DataType::Tags, 0, Err(e)),
        };
        info!("Syncing tags of {} (cached version {})", library, since);

        let result = self.tags_cycle(library, &key).await;
        self.finish(library, DataType::Tags, since, result)
    }

    async fn tags_cycle(
        &self,
        library: &Library,
        key: &CacheKey,
    ) -> SyncResult<(TagSnapshot, SyncDelta)> {
        // Tags carry no key to merge on, so the whole list is refetched
        let fetched = self.fetcher.fetch(library, DataType::Tags, 0).await?;
        let tags = fetched
            .records
            .iter()
            .map(Tag::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        self.set_phase(library, DataType::Tags, SyncPhase::Merging);

        let snapshot = TagSnapshot {
            data: tags.clone(),
            last_updated: fetched.remote_version,
            fetched_at: Some(Utc::now()),
        };
        self.commit(key, &snapshot)?;

        info!(
            "Synced tags of {}: {} tags at version {}",
            library,
            snapshot.len(),
            snapshot.last_updated
        );
        Ok((snapshot, SyncDelta::Tags(tags)))
    }

    /// Refetch tags when their snapshot is older than `version`
    ///
    /// Runs as its own cycle; a failure is logged and published but does not
    /// abort the item cycle that triggered it.
    async fn refresh_tags_if_stale(&self, library: &Library, version: u64) {
        let cached = match self.cached_tags(library) {
            Ok(cached) => cached.map_or(0, |s| s.last_updated),
            Err(e) => {
                warn!("Could not read cached tags of {}: {}", library, e);
                0
            }
        };

        if cached < version {
            debug!(
                "Tags of {} are stale ({} < {}), refetching",
                library, cached, version
            );
            if let Err(e) = self.sync_tags(library).await {
                warn!("Tag refresh for {} failed: {}", library, e);
            }
        }
    }

    /// Sync items, collections and tags of a library
    ///
    /// Items and collections run concurrently; both settle before the first
    /// error is returned. Tags are refetched afterwards if still stale.
    pub async fn sync_library(&self, library: &Library) -> SyncResult<LibrarySync> {
        let (items, collections) = tokio::join!(
            self.sync_records(library, RecordType::Items),
            self.sync_records(library, RecordType::Collections)
        );
        let items = items?;
        let collections = collections?;

        let tags = match self.cached_tags(library)? {
            Some(tags) if tags.last_updated >= items.last_updated => tags,
            _ => self.sync_tags(library).await?,
        };

        Ok(LibrarySync {
            items,
            collections,
            tags,
        })
    }

    // ==================== Tags ====================

    /// Tag map of a library, from cache or a fresh tag sync
    pub async fn tag_map(&self, library: &Library) -> SyncResult<TagMap> {
        let snapshot = match self.cached_tags(library)? {
            Some(snapshot) => snapshot,
            None => self.sync_tags(library).await?,
        };
        Ok(build_tag_map(snapshot.data))
    }

    /// Merge suggestions for every tag cluster of a library
    pub async fn tag_suggestions(
        &self,
        library: &Library,
        index: &dyn AnnotationIndex,
    ) -> SyncResult<Vec<BucketSuggestions>> {
        let map = self.tag_map(library).await?;
        let buckets = match_roam_pages(tokenize(&map), index).await;
        Ok(suggest_all(buckets))
    }

    /// Delete tags from the remote library, then refetch the tag list
    ///
    /// Requests are conditional on the cached tag version; if the library
    /// moved on, this fails with [`SyncError::VersionConflict`] and the
    /// caller decides whether to sync and retry. Returns the new library
    /// version.
    pub async fn delete_tags(&self, library: &Library, tags: &[String]) -> SyncResult<u64> {
        let mut version = match self.cached_tags(library)? {
            Some(snapshot) => snapshot.last_updated,
            None => self.sync_tags(library).await?.last_updated,
        };
        if tags.is_empty() {
            return Ok(version);
        }

        for batch in tags.chunks(TAG_DELETE_BATCH) {
            version = self
                .client
                .delete_tags(&library.path, batch, version)
                .await?;
        }
        info!(
            "Deleted {} tags from {}, now at version {}",
            tags.len(),
            library,
            version
        );

        self.sync_tags(library).await?;
        Ok(version)
    }

    // ==================== Internals ====================

    fn finish<T>(
        &self,
        library: &Library,
        data_type: DataType,
        since: u64,
        result: SyncResult<(LibrarySnapshot<T>, SyncDelta)>,
    ) -> SyncResult<LibrarySnapshot<T>> {
        match result {
            Ok((snapshot, delta)) => {
                self.set_phase(library, data_type, SyncPhase::Done);
                self.emit(SyncEvent::Completed(SyncOutcome {
                    data_type,
                    library_path: library.path.clone(),
                    success: true,
                    version: Some(snapshot.last_updated),
                    data: Some(delta),
                    error: None,
                }));
                Ok(snapshot)
            }
            Err(error) => {
                let error = error.in_cycle(data_type, &library.path, since);
                warn!("{}", error);
                self.set_phase(library, data_type, SyncPhase::Failed);
                self.emit(SyncEvent::Completed(SyncOutcome {
                    data_type,
                    library_path: library.path.clone(),
                    success: false,
                    version: None,
                    data: None,
                    error: Some(error.to_string()),
                }));
                Err(error)
            }
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &CacheKey) -> SyncResult<Option<T>> {
        self.cache
            .get(key)?
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| SyncError::decode(format!("cached {}", key), e))
            })
            .transpose()
    }

    fn commit<T: Serialize>(&self, key: &CacheKey, snapshot: &T) -> SyncResult<()> {
        let value = serde_json::to_value(snapshot)
            .map_err(|e| SyncError::decode(format!("snapshot {}", key), e))?;
        self.cache.set(key, value)?;
        Ok(())
    }

    fn set_phase(&self, library: &Library, data_type: DataType, phase: SyncPhase) {
        debug!("{} of {}: {:?}", data_type, library, phase);
        self.emit(SyncEvent::PhaseChanged {
            data_type,
            library_path: library.path.clone(),
            phase,
        });
    }

    fn emit(&self, event: SyncEvent) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}
