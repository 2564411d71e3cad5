//! Tag command handlers

use anyhow::{Context, Result};
use tracing::info;

use zotroam_core::{Config, PageIndex};

use super::{open_syncer, sync_failure};
use crate::output::Output;

/// Show merge suggestions for the library's tags
pub async fn suggestions(config: &Config, library: Option<&str>, output: &Output) -> Result<()> {
    let library = config.library(library)?;
    let index = match &config.roam_pages {
        Some(path) => PageIndex::load(path)?,
        None => {
            info!("No roam_pages configured, suggesting from Zotero tags only");
            PageIndex::default()
        }
    };

    let syncer = open_syncer(config)?;
    let buckets = syncer
        .tag_suggestions(&library, &index)
        .await
        .map_err(|e| sync_failure(e, output))
        .with_context(|| format!("Failed to build tag suggestions for {}", library))?;

    output.print_suggestions(&buckets);
    Ok(())
}

/// List tags with the number of items using them
pub async fn list(config: &Config, library: Option<&str>, output: &Output) -> Result<()> {
    let library = config.library(library)?;
    let syncer = open_syncer(config)?;
    let map = syncer
        .tag_map(&library)
        .await
        .map_err(|e| sync_failure(e, output))?;

    let tags: Vec<(String, u64)> = map
        .iter()
        .map(|(name, entry)| {
            let count = entry.tags().iter().map(|t| t.meta.num_items).sum();
            (name.to_string(), count)
        })
        .collect();

    output.print_tags(&tags);
    Ok(())
}

/// Delete tags from every item of the library
///
/// A stale tag version is refreshed once before giving up.
pub async fn delete(
    config: &Config,
    library: Option<&str>,
    tags: Vec<String>,
    output: &Output,
) -> Result<()> {
    let library = config.library(library)?;
    let syncer = open_syncer(config)?;

    let version = match syncer.delete_tags(&library, &tags).await {
        Err(e) if e.is_version_conflict() => {
            info!("Tag list of {} is stale, refreshing before retry", library);
            syncer
                .sync_tags(&library)
                .await
                .map_err(|e| sync_failure(e, output))?;
            syncer
                .delete_tags(&library, &tags)
                .await
                .map_err(|e| sync_failure(e, output))?
        }
        result => result.map_err(|e| sync_failure(e, output))?,
    };

    output.success(&format!(
        "Deleted {} tag(s) from {} (now at version {})",
        tags.len(),
        library,
        version
    ));
    Ok(())
}
