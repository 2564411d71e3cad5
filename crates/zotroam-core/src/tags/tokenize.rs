//! Tag tokenization
//!
//! Collapses spelling and case variants of a tag ("PKM", "pkm",
//! "self-care", "Self Care") into one [`TagEntry`], bucketed by initial.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::map::TagMap;
use super::roam::RoamPage;
use crate::models::Tag;

/// One tag cluster: a token, its Roam pages and its Zotero tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Lower-cased first-seen spelling of the cluster
    pub token: String,
    /// Matching Roam pages
    pub roam: Vec<RoamPage>,
    /// Zotero tags of the cluster, sorted by descending tag string
    pub zotero: Vec<Tag>,
}

impl TagEntry {
    pub fn new(token: impl Into<String>, zotero: Vec<Tag>) -> Self {
        Self {
            token: token.into(),
            roam: Vec::new(),
            zotero,
        }
    }
}

/// Tag entries grouped by bucket initial, each bucket sorted by token
pub type TagBuckets = BTreeMap<String, Vec<TagEntry>>;

/// Order in which tag strings are visited within a bucket
///
/// The first visited spelling of a cluster becomes its token, so the order
/// decides which variant names the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstSeenOrder {
    /// Reverse lexicographic: "pkm" is visited before "PKM"
    #[default]
    Descending,
    Ascending,
}

/// Bucket of a tag string: its first character, lower-cased
pub fn bucket_initial(s: &str) -> String {
    s.chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_default()
}

/// Comparison form of a tag: lower-cased, with `-`, `_` and whitespace removed
pub fn compound_key(s: &str) -> String {
    s.chars()
        .filter(|c| !(c.is_whitespace() || *c == '-' || *c == '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Cluster the tag map into bucketed entries, visiting spellings in descending order
pub fn tokenize(tag_map: &TagMap) -> TagBuckets {
    tokenize_with_order(tag_map, FirstSeenOrder::Descending)
}

/// Cluster the tag map into bucketed entries
pub fn tokenize_with_order(tag_map: &TagMap, order: FirstSeenOrder) -> TagBuckets {
    let mut by_initial: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for key in tag_map.keys() {
        by_initial.entry(bucket_initial(key)).or_default().push(key);
    }

    by_initial
        .into_iter()
        .map(|(initial, mut keys)| {
            match order {
                FirstSeenOrder::Descending => keys.sort_by(|a, b| b.cmp(a)),
                FirstSeenOrder::Ascending => keys.sort(),
            }

            let mut entries: Vec<TagEntry> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();

            for key in keys {
                let Some(tags) = tag_map.get(key).map(|e| e.tags().to_vec()) else {
                    continue;
                };
                let compound = compound_key(key);
                match index.get(&compound) {
                    Some(&i) => entries[i].zotero.extend(tags),
                    None => {
                        index.insert(compound, entries.len());
                        entries.push(TagEntry::new(key.to_lowercase(), tags));
                    }
                }
            }

            for entry in &mut entries {
                entry.zotero.sort_by(|a, b| b.tag.cmp(&a.tag));
            }
            entries.sort_by(|a, b| a.token.cmp(&b.token));

            (initial, entries)
        })
        .collect()
}
