//! zotroam core library
//!
//! Keeps local snapshots of Zotero libraries in step with the Zotero Web API
//! and reconciles Zotero tags with the pages of a Roam graph.
//!
//! # Architecture
//!
//! - **Sync**: version-driven incremental fetch, tombstone reconciliation and
//!   keyed merge into a durable snapshot per `(data type, library, identity)`
//! - **Tags**: tag map, case/compound-insensitive tokenization, Roam page
//!   matching and merge suggestions
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let client = Arc::new(HttpLibraryClient::new(&config.api_base_url, config.api_key.clone())?);
//! let cache = Arc::new(FileCache::new(config.cache_dir()));
//! let syncer = Syncer::new(client, cache);
//!
//! let library = config.library(None)?;
//! let items = syncer.sync_records(&library, RecordType::Items).await?;
//! let suggestions = syncer.tag_suggestions(&library, &PageIndex::default()).await?;
//! ```
//!
//! # Modules
//!
//! - `sync`: fetcher, reconciler, merger and the `Syncer` orchestrator
//! - `tags`: tag map, tokenizer, Roam matcher and suggestion engine
//! - `client`: `LibraryClient` trait and its HTTP implementation
//! - `storage`: `DurableCache` trait with memory and file backends
//! - `models`: records, snapshots, tags and library references
//! - `config`: application configuration

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;
pub mod tags;

pub use client::{ClientError, HttpLibraryClient, LibraryClient};
pub use config::Config;
pub use error::{SyncError, SyncResult, TagError};
pub use models::{
    DataType, DeletedKeys, Library, LibraryRecord, LibrarySnapshot, RecordType, Tag, TagMeta,
    TagSnapshot, TagType,
};
pub use storage::{CacheError, CacheKey, DurableCache, FileCache, MemoryCache};
pub use sync::{LibrarySync, SyncEvent, SyncOutcome, SyncPhase, Syncer};
pub use tags::{BucketSuggestions, PageIndex, RoamPage, TagMap};
