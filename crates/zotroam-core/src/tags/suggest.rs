//! Merge suggestions for tag clusters

use serde::Serialize;

use super::tokenize::{TagBuckets, TagEntry};
use crate::models::TagType;

/// How a cluster can be cleaned up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeType {
    /// A single safe merge target exists
    Auto,
    /// Several live spellings; a human has to pick one
    Manual,
}

/// Spellings a suggestion draws from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionUse {
    /// Roam page titles
    pub roam: Vec<String>,
    /// Zotero tag strings not already used as a Roam title
    pub zotero: Vec<String>,
}

/// Recommended spelling for a tag cluster
///
/// `merge_type == None` means there is nothing to clean up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub recommend: Option<String>,
    #[serde(rename = "type")]
    pub merge_type: Option<MergeType>,
    #[serde(rename = "use")]
    pub uses: SuggestionUse,
}

/// Compute the suggestion for one tag entry
pub fn suggest(entry: &TagEntry) -> Suggestion {
    let roam: Vec<String> = entry.roam.iter().map(|p| p.title.clone()).collect();

    let mut zotero: Vec<String> = Vec::new();
    for tag in &entry.zotero {
        if !roam.contains(&tag.tag) && !zotero.contains(&tag.tag) {
            zotero.push(tag.tag.clone());
        }
    }

    let (recommend, merge_type) = match roam.len() {
        0 if entry.zotero.len() == 1 => (Some(entry.zotero[0].tag.clone()), None),
        0 if zotero.len() == 1 => (Some(zotero[0].clone()), Some(MergeType::Auto)),
        0 if zotero.is_empty() => (None, None),
        0 => (
            entry
                .zotero
                .iter()
                .find(|t| t.meta.tag_type == TagType::Manual)
                .map(|t| t.tag.clone()),
            Some(MergeType::Manual),
        ),
        1 if zotero.is_empty() => {
            let merge_type = (entry.zotero.len() > 1).then_some(MergeType::Auto);
            (Some(roam[0].clone()), merge_type)
        }
        1 => (Some(roam[0].clone()), Some(MergeType::Auto)),
        _ => (None, Some(MergeType::Manual)),
    };

    Suggestion {
        recommend,
        merge_type,
        uses: SuggestionUse { roam, zotero },
    }
}

/// A tag entry together with its suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedEntry {
    #[serde(flatten)]
    pub entry: TagEntry,
    pub suggestion: Suggestion,
}

/// Suggestions of one alphabetical bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSuggestions {
    pub bucket: String,
    pub entries: Vec<SuggestedEntry>,
}

/// Attach a suggestion to every entry, keeping bucket and entry order
pub fn suggest_all(buckets: TagBuckets) -> Vec<BucketSuggestions> {
    buckets
        .into_iter()
        .map(|(bucket, entries)| BucketSuggestions {
            bucket,
            entries: entries
                .into_iter()
                .map(|entry| {
                    let suggestion = suggest(&entry);
                    SuggestedEntry { entry, suggestion }
                })
                .collect(),
        })
        .collect()
}
