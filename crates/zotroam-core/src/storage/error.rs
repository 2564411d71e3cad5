//! Cache error handling
//!
//! Provides typed errors for snapshot cache operations with descriptive
//! messages and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing cached snapshots
#[derive(Error, Debug)]
pub enum CacheError {
    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read a cache entry
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a cache entry
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cache entry exists but is not valid JSON
    #[error("Cache entry '{path}' is corrupted: {details}")]
    CorruptEntry { path: PathBuf, details: String },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// In-memory cache lock was poisoned by a panicking writer
    #[error("Cache lock poisoned")]
    Poisoned,
}

impl CacheError {
    /// Create an error from a write-side I/O error with path context
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => CacheError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => CacheError::DiskFull {
                path,
                source: error,
            },
            _ => CacheError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CacheError::DiskFull { .. }
                | CacheError::PermissionDenied { .. }
                | CacheError::CorruptEntry { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            CacheError::DiskFull { .. } => Some("Free up disk space and try again."),
            CacheError::PermissionDenied { .. } => {
                Some("Check file and directory permissions of the cache directory.")
            }
            CacheError::CorruptEntry { .. } => {
                Some("Delete the corrupted cache file; the next sync will refetch it from scratch.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
