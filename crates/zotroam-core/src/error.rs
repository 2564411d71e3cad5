//! Sync engine errors
//!
//! Component errors bubble up unmodified; the orchestrator only wraps them
//! in [`SyncError::Cycle`] to record which library, data type and version
//! were in flight.

use thiserror::Error;

use crate::client::ClientError;
use crate::models::DataType;
use crate::storage::CacheError;

/// Errors raised while validating or grouping tags
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A raw tag lacks `tag` or `meta`
    #[error("Invalid tag shape: {details}")]
    InvalidTagShape { details: String },

    /// A raw tag has no `meta.type`
    #[error("Tag '{tag}' has no type")]
    MissingTagType { tag: String },

    /// A stored tag map entry is neither a tag nor a list of distinct tags
    #[error("Malformed tag map entry: found {found}")]
    MalformedTagMapEntry { found: String },
}

/// Errors that can occur during a sync cycle
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or HTTP failure talking to the library
    #[error("Transport error: {0}")]
    Transport(#[source] ClientError),

    /// A write was rejected because the library changed since `version`
    #[error("Library '{library_path}' was modified since version {version}; refetch and retry")]
    VersionConflict { library_path: String, version: u64 },

    /// Tag validation failed
    #[error(transparent)]
    Tag(#[from] TagError),

    /// Response or cached payload could not be decoded
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot cache failure
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A failure inside a sync cycle, with the cycle's context
    #[error("Sync of {data_type} for '{library_path}' (since version {since}) failed: {source}")]
    Cycle {
        data_type: DataType,
        library_path: String,
        since: u64,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub(crate) fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        SyncError::Decode {
            what: what.into(),
            source,
        }
    }

    /// Wrap this error with the context of the cycle it happened in
    pub fn in_cycle(self, data_type: DataType, library_path: &str, since: u64) -> Self {
        SyncError::Cycle {
            data_type,
            library_path: library_path.to_string(),
            since,
            source: Box::new(self),
        }
    }

    /// The underlying error, without cycle context
    pub fn root(&self) -> &SyncError {
        match self {
            SyncError::Cycle { source, .. } => source.root(),
            other => other,
        }
    }

    /// How to fix a local cache failure, if this is one the user can fix
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self.root() {
            SyncError::Cache(cache) if cache.is_recoverable() => cache.recovery_suggestion(),
            _ => None,
        }
    }

    /// Whether the caller should refetch before retrying a write
    pub fn is_version_conflict(&self) -> bool {
        matches!(self.root(), SyncError::VersionConflict { .. })
    }
}

impl From<ClientError> for SyncError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::PreconditionFailed {
                library_path,
                version,
            } => SyncError::VersionConflict {
                library_path,
                version,
            },
            other => SyncError::Transport(other),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
