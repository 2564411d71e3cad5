//! Incremental library sync
//!
//! Keeps a local snapshot of each `(data type, library)` in step with the
//! remote library:
//!
//! 1. Read the cached snapshot and its `last_updated` version
//! 2. Fetch every record modified since that version, page by page
//! 3. Fetch tombstones when the library may have deleted something
//! 4. Merge the delta into the snapshot and commit it
//!
//! ## Usage
//!
//! ```ignore
//! let syncer = Syncer::new(client, cache);
//! let mut events = syncer.subscribe();
//! let snapshot = syncer.sync_records(&library, RecordType::Items).await?;
//! ```

mod fetcher;
mod merge;
mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{
    needs_reconciliation, overflow_offsets, DeletionReconciler, FetchResult, VersionedFetcher,
    PAGE_SIZE,
};
pub use merge::merge;
pub use orchestrator::{
    LibrarySync, SyncDelta, SyncEvent, SyncOutcome, SyncPhase, Syncer, TAG_DELETE_BATCH,
};
