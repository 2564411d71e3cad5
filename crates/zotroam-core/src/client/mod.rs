//! Library client capability
//!
//! The sync engine only needs three operations from the remote library:
//! a paginated read, the tombstone list, and tag deletion. [`LibraryClient`]
//! captures them so the engine can run against the Zotero Web API
//! ([`HttpLibraryClient`]) or an in-process fake in tests.

mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::DeletedKeys;

pub use http::HttpLibraryClient;

/// Query parameters of a paginated read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Only return records modified after this library version
    pub since: Option<u64>,
    /// Offset of the first record
    pub start: Option<u64>,
    /// Maximum number of records
    pub limit: u64,
}

/// One page of a paginated read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub data: Vec<Value>,
    /// `Last-Modified-Version` response header
    pub last_modified_version: Option<u64>,
    /// `Total-Results` response header
    pub total_results: Option<u64>,
}

/// Errors raised by a library client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request could not be sent or the response not read
    #[error("Request to '{url}' failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with an unexpected status
    #[error("Server returned HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    /// A conditional write was rejected (HTTP 412)
    #[error("Library '{library_path}' was modified since version {version}")]
    PreconditionFailed { library_path: String, version: u64 },

    /// The response was not what the API documents
    #[error("Invalid response from '{url}': {details}")]
    InvalidResponse { url: String, details: String },
}

/// Remote library operations used by the sync engine
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// Read one page of `resource_path` (e.g. `users/1/items`)
    async fn get(&self, resource_path: &str, request: PageRequest) -> Result<Page, ClientError>;

    /// Keys deleted from the library since `since`
    async fn get_deleted(&self, library_path: &str, since: u64)
        -> Result<DeletedKeys, ClientError>;

    /// Delete tags from every item of the library
    ///
    /// Fails with [`ClientError::PreconditionFailed`] if the library changed
    /// after `version`. Returns the new library version.
    async fn delete_tags(
        &self,
        library_path: &str,
        tags: &[String],
        version: u64,
    ) -> Result<u64, ClientError>;
}
