//! In-process library client for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ClientError, LibraryClient, Page, PageRequest};
use crate::models::DeletedKeys;

#[derive(Default)]
struct State {
    version: u64,
    records: HashMap<String, Vec<Value>>,
    deleted: DeletedKeys,
    requests: Vec<(String, PageRequest)>,
    deleted_requests: usize,
    deleted_tag_batches: Vec<(Vec<String>, u64)>,
    failing_start: Option<u64>,
    fail_deleted: bool,
    omit_version: bool,
}

/// Serves records from memory, filtering by `since` like the Web API does
///
/// Pages and rejects stale tag deletes the same way as the integration-test
/// `FakeLibrary`; records and versions are scripted instead of edited.
pub struct FakeClient {
    state: Mutex<State>,
}

impl FakeClient {
    pub fn new(version: u64) -> Self {
        Self {
            state: Mutex::new(State {
                version,
                ..Default::default()
            }),
        }
    }

    pub fn set_version(&self, version: u64) {
        self.state.lock().unwrap().version = version;
    }

    pub fn set_records(&self, path: &str, records: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(path.to_string(), records);
    }

    pub fn set_deleted(&self, deleted: DeletedKeys) {
        self.state.lock().unwrap().deleted = deleted;
    }

    /// Make the page starting at `start` fail (`0` is the first page)
    pub fn fail_page(&self, start: u64) {
        self.state.lock().unwrap().failing_start = Some(start);
    }

    pub fn fail_deleted(&self) {
        self.state.lock().unwrap().fail_deleted = true;
    }

    pub fn omit_version_header(&self) {
        self.state.lock().unwrap().omit_version = true;
    }

    pub fn requests(&self) -> Vec<(String, PageRequest)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn deleted_requests(&self) -> usize {
        self.state.lock().unwrap().deleted_requests
    }

    pub fn deleted_tag_batches(&self) -> Vec<(Vec<String>, u64)> {
        self.state.lock().unwrap().deleted_tag_batches.clone()
    }
}

#[async_trait]
impl LibraryClient for FakeClient {
    async fn get(&self, resource_path: &str, request: PageRequest) -> Result<Page, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((resource_path.to_string(), request));

        let start = request.start.unwrap_or(0);
        if state.failing_start == Some(start) {
            return Err(ClientError::Status {
                url: resource_path.to_string(),
                status: 500,
            });
        }

        let since = request.since.unwrap_or(0);
        let matching: Vec<Value> = state
            .records
            .get(resource_path)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.get("version").and_then(Value::as_u64).map_or(true, |v| v > since))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let data = matching
            .iter()
            .skip(start as usize)
            .take(request.limit as usize)
            .cloned()
            .collect();

        Ok(Page {
            data,
            last_modified_version: (!state.omit_version).then_some(state.version),
            total_results: Some(matching.len() as u64),
        })
    }

    async fn get_deleted(
        &self,
        library_path: &str,
        _since: u64,
    ) -> Result<DeletedKeys, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.deleted_requests += 1;
        if state.fail_deleted {
            return Err(ClientError::Request {
                url: format!("{}/deleted", library_path),
                message: "connection reset".to_string(),
            });
        }
        Ok(state.deleted.clone())
    }

    async fn delete_tags(
        &self,
        library_path: &str,
        tags: &[String],
        version: u64,
    ) -> Result<u64, ClientError> {
        let mut state = self.state.lock().unwrap();
        if version < state.version {
            return Err(ClientError::PreconditionFailed {
                library_path: library_path.to_string(),
                version,
            });
        }
        state.deleted_tag_batches.push((tags.to_vec(), version));
        state.version += 1;
        let tags_path = format!("{}/tags", library_path);
        if let Some(records) = state.records.get_mut(&tags_path) {
            records.retain(|r| {
                r.get("tag")
                    .and_then(Value::as_str)
                    .map_or(true, |t| !tags.iter().any(|d| d == t))
            });
        }
        Ok(state.version)
    }
}
