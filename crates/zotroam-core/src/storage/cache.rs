//! Snapshot cache interface
//!
//! Snapshots are stored as opaque JSON values keyed by
//! `(data type, library path, request identity)`. Writes are
//! last-writer-wins; callers must not run overlapping syncs for one key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde_json::Value;

use super::error::{CacheError, CacheResult};
use crate::models::{DataType, Library};

/// Key of a cached snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub data_type: DataType,
    pub library_path: String,
    pub identity: String,
}

impl CacheKey {
    pub fn new(data_type: DataType, library: &Library) -> Self {
        Self {
            data_type,
            library_path: library.path.clone(),
            identity: library.identity.clone(),
        }
    }

    /// Flat name usable as a file name: `items_users%2F123_default`
    ///
    /// Parts are joined with `_`, which is always escaped inside a part, so
    /// distinct keys never share a file.
    pub fn file_stem(&self) -> String {
        [
            self.data_type.to_string(),
            escape_part(&self.library_path),
            escape_part(&self.identity),
        ]
        .join("_")
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9-]`
fn escape_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for byte in part.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.data_type, self.library_path, self.identity)
    }
}

/// Durable key-value store for snapshots
pub trait DurableCache: Send + Sync {
    /// Read a cached value, `None` if nothing was ever committed for `key`
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Commit a value, replacing any previous one
    fn set(&self, key: &CacheKey, value: Value) -> CacheResult<()>;
}

/// In-memory cache
///
/// Nothing survives the process; used in tests and for one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &CacheKey, value: Value) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_display_and_stem() {
        let key = CacheKey::new(DataType::Items, &Library::new("users/123", "default"));
        assert_eq!(key.to_string(), "items/users/123/default");
        assert_eq!(key.file_stem(), "items_users%2F123_default");
    }

    #[test]
    fn test_stems_differ_for_punctuation_variants() {
        let stem = |path: &str, identity: &str| {
            CacheKey::new(DataType::Items, &Library::new(path, identity)).file_stem()
        };

        assert_ne!(stem("users/1", "lab.team"), stem("users/1", "lab_team"));
        assert_ne!(stem("users/1", "a/b"), stem("users/1", "a_b"));
        assert_ne!(stem("users/1_x", "y"), stem("users/1", "x_y"));
        assert_eq!(stem("users/1", "été"), "items_users%2F1_%C3%A9t%C3%A9");
    }

    #[test]
    fn test_keys_are_scoped_by_identity() {
        let a = CacheKey::new(DataType::Tags, &Library::new("groups/1", "work"));
        let b = CacheKey::new(DataType::Tags, &Library::new("groups/1", "home"));
        assert_ne!(a, b);
        assert_ne!(a.file_stem(), b.file_stem());
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        let key = CacheKey::new(DataType::Collections, &Library::new("users/1", "default"));

        assert!(cache.get(&key).unwrap().is_none());

        cache.set(&key, json!({"data": [], "lastUpdated": 4})).unwrap();
        cache.set(&key, json!({"data": [], "lastUpdated": 9})).unwrap();

        assert_eq!(cache.get(&key).unwrap().unwrap()["lastUpdated"], 9);
    }
}
