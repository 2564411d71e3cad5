//! Tag map
//!
//! Groups a library's tag list by exact tag string. A string used both as a
//! manual and an automatic tag keeps both variants; a tag listed twice is
//! stored once.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::TagError;
use crate::models::Tag;

/// Tags stored under one tag string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TagMapEntry {
    /// Only one type variant seen
    Single(Tag),
    /// Several type variants, in first-seen order, never mutual duplicates
    Multiple(Vec<Tag>),
}

impl TagMapEntry {
    pub fn tags(&self) -> &[Tag] {
        match self {
            TagMapEntry::Single(tag) => std::slice::from_ref(tag),
            TagMapEntry::Multiple(tags) => tags,
        }
    }

    pub fn into_tags(self) -> Vec<Tag> {
        match self {
            TagMapEntry::Single(tag) => vec![tag],
            TagMapEntry::Multiple(tags) => tags,
        }
    }

    /// Add `tag` unless it duplicates a stored tag; returns whether it was added
    fn add(&mut self, tag: Tag) -> bool {
        if self.tags().iter().any(|t| t.is_duplicate(&tag)) {
            return false;
        }
        match self {
            TagMapEntry::Multiple(tags) => tags.push(tag),
            TagMapEntry::Single(existing) => {
                let existing = existing.clone();
                *self = TagMapEntry::Multiple(vec![existing, tag]);
            }
        }
        true
    }
}

/// Tags of a library keyed by exact tag string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagMap {
    entries: BTreeMap<String, TagMapEntry>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tag; returns `false` if an identical tag was already stored
    pub fn insert(&mut self, tag: Tag) -> bool {
        match self.entries.get_mut(&tag.tag) {
            Some(entry) => entry.add(tag),
            None => {
                self.entries
                    .insert(tag.tag.clone(), TagMapEntry::Single(tag));
                true
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&TagMapEntry> {
        self.entries.get(tag)
    }

    /// Number of distinct tag strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagMapEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rebuild a map from its serialized form
    ///
    /// Every entry must be a tag object, or an array of at least two
    /// distinct tags, stored under its own tag string.
    pub fn from_json(value: &Value) -> Result<TagMap, TagError> {
        let Value::Object(object) = value else {
            return Err(TagError::MalformedTagMapEntry {
                found: format!("{} instead of a map", json_type(value)),
            });
        };

        let mut entries = BTreeMap::new();
        for (key, raw) in object {
            let entry = match raw {
                Value::Object(_) => TagMapEntry::Single(Tag::from_value(raw)?),
                Value::Array(items) if items.len() >= 2 => {
                    let tags = items
                        .iter()
                        .map(|item| match item {
                            Value::Object(_) => Tag::from_value(item),
                            other => Err(TagError::MalformedTagMapEntry {
                                found: format!("{} inside '{}'", json_type(other), key),
                            }),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    for (i, tag) in tags.iter().enumerate() {
                        if tags[..i].iter().any(|t| t.is_duplicate(tag)) {
                            return Err(TagError::MalformedTagMapEntry {
                                found: format!("duplicate tags under '{}'", key),
                            });
                        }
                    }
                    TagMapEntry::Multiple(tags)
                }
                Value::Array(items) => {
                    return Err(TagError::MalformedTagMapEntry {
                        found: format!("array of length {} under '{}'", items.len(), key),
                    })
                }
                other => {
                    return Err(TagError::MalformedTagMapEntry {
                        found: format!("{} under '{}'", json_type(other), key),
                    })
                }
            };

            if let Some(stray) = entry.tags().iter().find(|t| &t.tag != key) {
                return Err(TagError::MalformedTagMapEntry {
                    found: format!("tag '{}' under '{}'", stray.tag, key),
                });
            }
            entries.insert(key.clone(), entry);
        }

        Ok(TagMap { entries })
    }
}

impl IntoIterator for TagMap {
    type Item = (String, TagMapEntry);
    type IntoIter = std::collections::btree_map::IntoIter<String, TagMapEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a tag map from validated tags
pub fn build_tag_map(tags: impl IntoIterator<Item = Tag>) -> TagMap {
    let mut map = TagMap::new();
    for tag in tags {
        map.insert(tag);
    }
    map
}

/// Validate raw tag objects from the Web API and build a tag map
pub fn build_tag_map_from_values(values: &[Value]) -> Result<TagMap, TagError> {
    let tags = values
        .iter()
        .map(Tag::from_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(build_tag_map(tags))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
