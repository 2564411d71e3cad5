//! Roam page matching
//!
//! Attaches Roam pages to the tag entries whose token they spell.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tokenize::TagBuckets;

/// A page of the Roam graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoamPage {
    pub title: String,
    #[serde(rename = "uid", alias = "pageId")]
    pub page_id: String,
}

impl RoamPage {
    pub fn new(title: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page_id: page_id.into(),
        }
    }
}

/// Title lookup in the annotation graph
pub trait AnnotationIndex: Send + Sync {
    /// Pages whose title starts with any of `initials`
    fn find_by_initial(&self, initials: &[String]) -> Vec<RoamPage>;
}

/// Annotation index over an in-memory page list
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: Vec<RoamPage>,
}

impl PageIndex {
    pub fn new(pages: Vec<RoamPage>) -> Self {
        Self { pages }
    }

    /// Load a JSON array of `{ "title", "uid" }` objects
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Roam pages from {:?}", path))?;
        let pages: Vec<RoamPage> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse Roam pages in {:?}", path))?;
        Ok(Self::new(pages))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl AnnotationIndex for PageIndex {
    fn find_by_initial(&self, initials: &[String]) -> Vec<RoamPage> {
        self.pages
            .iter()
            .filter(|page| initials.iter().any(|i| page.title.starts_with(i.as_str())))
            .cloned()
            .collect()
    }
}

/// Attach matching Roam pages to every tag entry
///
/// Each bucket queries the index for titles starting with the bucket's
/// initial in both cases. A page is attached to the entry whose token equals
/// its title, ignoring case; existing page refs are kept. Yields to the
/// runtime between buckets so large libraries don't monopolize the executor.
pub async fn match_roam_pages(mut buckets: TagBuckets, index: &dyn AnnotationIndex) -> TagBuckets {
    let mut matched = 0;

    for (initial, entries) in buckets.iter_mut() {
        tokio::task::yield_now().await;

        let mut initials = vec![initial.clone()];
        let upper = initial.to_uppercase();
        if upper != *initial {
            initials.push(upper);
        }

        let mut pages = index.find_by_initial(&initials);
        pages.sort_by(|a, b| b.title.cmp(&a.title));

        for page in pages {
            let title = page.title.to_lowercase();
            if let Some(entry) = entries.iter_mut().find(|e| e.token == title) {
                entry.roam.push(page);
                matched += 1;
            }
        }
    }

    debug!("Matched {} Roam pages to tags", matched);
    buckets
}
