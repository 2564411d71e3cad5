//! Data models for zotroam
//!
//! Defines the records mirrored from a remote Zotero library (items,
//! collections, tags), the versioned snapshot they are cached in, and the
//! tombstone set returned by the deletion endpoint.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TagError;

/// The kind of data cached for a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Items,
    Collections,
    Tags,
}

impl DataType {
    /// All data types, in the order a full library sync runs them
    pub const ALL: [DataType; 3] = [DataType::Items, DataType::Collections, DataType::Tags];

    /// Path segment of this data type in the Web API
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Items => "items",
            DataType::Collections => "collections",
            DataType::Tags => "tags",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyed, versioned record types merged with [`crate::sync::merge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Items,
    Collections,
}

impl RecordType {
    /// Keys of this record type within a tombstone set
    pub fn deleted_keys<'a>(&self, deleted: &'a DeletedKeys) -> &'a [String] {
        match self {
            RecordType::Items => &deleted.items,
            RecordType::Collections => &deleted.collections,
        }
    }
}

impl From<RecordType> for DataType {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Items => DataType::Items,
            RecordType::Collections => DataType::Collections,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DataType::from(*self).fmt(f)
    }
}

/// A remote library, plus the identity its requests are made under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Library {
    /// Library path in the Web API, e.g. `users/123` or `groups/456`
    pub path: String,
    /// Identity of the requester (cache entries are scoped to it)
    pub identity: String,
}

impl Library {
    pub fn new(path: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identity: identity.into(),
        }
    }

    /// Resource path for a data type in this library
    pub fn resource_path(&self, data_type: DataType) -> String {
        format!("{}/{}", self.path, data_type.as_str())
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// An item or collection as returned by the Web API
///
/// Only `key` and `version` are interpreted; the payload is carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryRecord {
    /// Stable identifier, unique within one library
    pub key: String,
    /// Library version at which this record last changed
    pub version: u64,
    /// Record payload
    #[serde(default)]
    pub data: Value,
    /// Server-side metadata (creator summary, child counts, ...)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub meta: Value,
}

impl LibraryRecord {
    pub fn new(key: impl Into<String>, version: u64, data: Value) -> Self {
        Self {
            key: key.into(),
            version,
            data,
            meta: Value::Null,
        }
    }
}

/// Anything that can be merged by key
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for LibraryRecord {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Cached state of one data type for one library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot<T = LibraryRecord> {
    /// Records, unique by key
    pub data: Vec<T>,
    /// Highest library version merged into `data`
    #[serde(rename = "lastUpdated")]
    pub last_updated: u64,
    /// When the snapshot was committed
    #[serde(default, rename = "fetchedAt", skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Default for LibrarySnapshot<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            last_updated: 0,
            fetched_at: None,
        }
    }
}

impl<T> LibrarySnapshot<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Snapshot of a library's tag list
pub type TagSnapshot = LibrarySnapshot<Tag>;

/// Keys deleted from a library since a given version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedKeys {
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub searches: Vec<String>,
}

impl DeletedKeys {
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
            && self.items.is_empty()
            && self.tags.is_empty()
            && self.searches.is_empty()
    }
}

/// Provenance of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TagType {
    /// Added by a user (type 0)
    Manual,
    /// Added automatically, e.g. on import (type 1)
    Automatic,
}

impl TryFrom<u8> for TagType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TagType::Manual),
            1 => Ok(TagType::Automatic),
            other => Err(format!("unknown tag type {}", other)),
        }
    }
}

impl From<TagType> for u8 {
    fn from(tag_type: TagType) -> Self {
        match tag_type {
            TagType::Manual => 0,
            TagType::Automatic => 1,
        }
    }
}

/// Server-side tag metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMeta {
    #[serde(rename = "type")]
    pub tag_type: TagType,
    #[serde(rename = "numItems", default)]
    pub num_items: u64,
}

/// A tag as listed by the library's `/tags` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    pub meta: TagMeta,
}

impl Tag {
    pub fn new(tag: impl Into<String>, tag_type: TagType, num_items: u64) -> Self {
        Self {
            tag: tag.into(),
            meta: TagMeta {
                tag_type,
                num_items,
            },
        }
    }

    /// Two tags are duplicates when both the string and the type match.
    ///
    /// Item counts are ignored: the same tag listed twice is still one tag.
    pub fn is_duplicate(&self, other: &Tag) -> bool {
        self.tag == other.tag && self.meta.tag_type == other.meta.tag_type
    }

    /// Validate and convert a raw tag object from the Web API
    pub fn from_value(value: &Value) -> Result<Tag, TagError> {
        let (Some(tag), Some(meta)) = (
            value.get("tag").and_then(Value::as_str),
            value.get("meta").filter(|m| m.is_object()),
        ) else {
            return Err(TagError::InvalidTagShape {
                details: "expected an object with `tag` and `meta`".to_string(),
            });
        };

        let tag_type = match meta.get("type") {
            None | Some(Value::Null) => {
                return Err(TagError::MissingTagType {
                    tag: tag.to_string(),
                })
            }
            Some(raw) => raw
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .and_then(|n| TagType::try_from(n).ok())
                .ok_or_else(|| TagError::InvalidTagShape {
                    details: format!("tag '{}' has an invalid type {}", tag, raw),
                })?,
        };

        let num_items = meta.get("numItems").and_then(Value::as_u64).unwrap_or(0);

        Ok(Tag::new(tag, tag_type, num_items))
    }
}
