//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use zotroam_core::client::{ClientError, LibraryClient, Page, PageRequest};
use zotroam_core::{DeletedKeys, FileCache, Library, Syncer};

/// In-memory Web API stand-in: one library, versioned records, tombstones
///
/// Paging, `since` filtering, `Total-Results` and the tag delete precondition
/// behave like the unit-test `FakeClient` in `sync::testing`. The difference is
/// how state changes: here every `put`/`remove` bumps the library version the
/// way real edits do, while `FakeClient` takes scripted records and versions
/// plus per-page fault injection.
#[derive(Default)]
pub struct FakeLibrary {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    version: u64,
    records: HashMap<String, Vec<Value>>,
    deleted: DeletedKeys,
    offline: bool,
    calls: Vec<(String, PageRequest)>,
}

impl FakeLibrary {
    pub fn new(version: u64) -> Arc<Self> {
        let library = Self::default();
        library.inner.lock().unwrap().version = version;
        Arc::new(library)
    }

    /// Add or replace a record, bumping the library version
    pub fn put(&self, resource: &str, key: &str, title: &str) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.version += 1;
        let version = inner.version;
        let records = inner.records.entry(resource.to_string()).or_default();
        records.retain(|r| r["key"] != key);
        records.push(json!({"key": key, "version": version, "data": {"title": title}}));
        version
    }

    /// Remove a record and record its tombstone
    pub fn remove(&self, resource: &str, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.version += 1;
        if let Some(records) = inner.records.get_mut(resource) {
            records.retain(|r| r["key"] != key);
        }
        if resource.ends_with("/items") {
            inner.deleted.items.push(key.to_string());
        } else {
            inner.deleted.collections.push(key.to_string());
        }
    }

    pub fn set_tags(&self, resource: &str, tags: Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(resource.to_string(), tags);
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().unwrap().version
    }

    pub fn calls(&self) -> Vec<(String, PageRequest)> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl LibraryClient for FakeLibrary {
    async fn get(&self, resource_path: &str, request: PageRequest) -> Result<Page, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((resource_path.to_string(), request));
        if inner.offline {
            return Err(ClientError::Request {
                url: resource_path.to_string(),
                message: "offline".to_string(),
            });
        }

        let since = request.since.unwrap_or(0);
        let matching: Vec<Value> = inner
            .records
            .get(resource_path)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r["version"].as_u64().map_or(true, |v| v > since))
            .collect();

        Ok(Page {
            data: matching
                .iter()
                .skip(request.start.unwrap_or(0) as usize)
                .take(request.limit as usize)
                .cloned()
                .collect(),
            last_modified_version: Some(inner.version),
            total_results: Some(matching.len() as u64),
        })
    }

    async fn get_deleted(
        &self,
        library_path: &str,
        _since: u64,
    ) -> Result<DeletedKeys, ClientError> {
        let inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(ClientError::Request {
                url: format!("{}/deleted", library_path),
                message: "offline".to_string(),
            });
        }
        Ok(inner.deleted.clone())
    }

    async fn delete_tags(
        &self,
        library_path: &str,
        tags: &[String],
        version: u64,
    ) -> Result<u64, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        if version < inner.version {
            return Err(ClientError::PreconditionFailed {
                library_path: library_path.to_string(),
                version,
            });
        }
        inner.version += 1;
        if let Some(records) = inner.records.get_mut(&format!("{}/tags", library_path)) {
            records.retain(|r| !tags.iter().any(|t| r["tag"] == t.as_str()));
        }
        Ok(inner.version)
    }
}

pub fn library() -> Library {
    Library::new("users/42", "default")
}

pub fn tag(name: &str, tag_type: u8) -> Value {
    json!({"tag": name, "meta": {"type": tag_type, "numItems": 1}})
}

/// A syncer over a file cache in `dir`
pub fn file_syncer(remote: &Arc<FakeLibrary>, dir: &TempDir) -> Syncer {
    Syncer::new(remote.clone(), Arc::new(FileCache::new(dir.path())))
}
