//! File-backed snapshot cache
//!
//! One JSON file per cache key under the cache directory. Uses atomic writes
//! (write to temp file, then rename) so a crash never leaves a half-written
//! snapshot behind.
//!
//! Storage location: `~/.local/share/zotroam/cache/` (configurable via `Config`)

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::cache::{CacheKey, DurableCache};
use super::error::{CacheError, CacheResult};

/// Snapshot cache stored as JSON files
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }
}

impl DurableCache for FileCache {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let path = self.path_for(key);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::ReadError { path, source }),
        };

        let value = serde_json::from_str(&content).map_err(|e| CacheError::CorruptEntry {
            path: path.clone(),
            details: e.to_string(),
        })?;

        Ok(Some(value))
    }

    fn set(&self, key: &CacheKey, value: Value) -> CacheResult<()> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(&value).map_err(|e| CacheError::CorruptEntry {
            path: path.clone(),
            details: e.to_string(),
        })?;

        atomic_write(&path, &bytes)?;
        debug!("Committed {} ({} bytes)", key, bytes.len());
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> CacheResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CacheError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| CacheError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| CacheError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| CacheError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| CacheError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, Library};
    use serde_json::json;
    use tempfile::TempDir;

    fn key(data_type: DataType) -> CacheKey {
        CacheKey::new(data_type, &Library::new("users/123", "default"))
    }

    #[test]
    fn test_get_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().join("cache"));

        assert!(cache.get(&key(DataType::Items)).unwrap().is_none());
    }

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().join("cache"));
        let value = json!({"data": [{"key": "ABC", "version": 3}], "lastUpdated": 3});

        cache.set(&key(DataType::Items), value.clone()).unwrap();

        assert!(cache.path_for(&key(DataType::Items)).exists());
        assert_eq!(cache.get(&key(DataType::Items)).unwrap(), Some(value));
        assert!(cache.get(&key(DataType::Collections)).unwrap().is_none());
    }

    #[test]
    fn test_set_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path());

        cache.set(&key(DataType::Tags), json!({"data": []})).unwrap();

        let path = cache.path_for(&key(DataType::Tags));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path());
        let path = cache.path_for(&key(DataType::Items));
        fs::write(&path, "{not json").unwrap();

        let err = cache.get(&key(DataType::Items)).unwrap_err();
        assert!(matches!(err, CacheError::CorruptEntry { .. }));
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("file.json");

        atomic_write(&nested_path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "{}");
    }

    #[test]
    fn test_punctuation_variants_keep_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path());
        let dotted = CacheKey::new(DataType::Items, &Library::new("users/1", "lab.team"));
        let underscored = CacheKey::new(DataType::Items, &Library::new("users/1", "lab_team"));

        cache.set(&dotted, json!({"owner": "dotted"})).unwrap();
        cache.set(&underscored, json!({"owner": "underscored"})).unwrap();

        assert_ne!(cache.path_for(&dotted), cache.path_for(&underscored));
        assert_eq!(cache.get(&dotted).unwrap(), Some(json!({"owner": "dotted"})));
        assert_eq!(
            cache.get(&underscored).unwrap(),
            Some(json!({"owner": "underscored"}))
        );
    }
}
