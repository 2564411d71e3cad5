//! Command handlers

pub mod config;
pub mod status;
pub mod sync;
pub mod tag;

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use zotroam_core::{Config, FileCache, HttpLibraryClient, Library, SyncError, Syncer};

use crate::output::Output;

/// Syncer over the Web API and the on-disk snapshot cache
pub fn open_syncer(config: &Config) -> Result<Syncer> {
    let client = HttpLibraryClient::new(&config.api_base_url, config.api_key.clone())
        .context("Failed to create Web API client")?;
    let cache = FileCache::new(config.cache_dir());
    Ok(Syncer::new(Arc::new(client), Arc::new(cache)))
}

/// Libraries a command applies to: the one given, or every configured one
pub fn target_libraries(config: &Config, library: Option<&str>) -> Result<Vec<Library>> {
    if library.is_some() {
        return Ok(vec![config.library(library)?]);
    }

    let libraries = config.libraries();
    if libraries.is_empty() {
        bail!(
            "No library configured. Set one with:\n  \
             zotroam config set libraries users/<id>"
        );
    }
    Ok(libraries)
}

/// Turn a sync failure into a command error, printing the cache fix hint first
pub fn sync_failure(err: SyncError, output: &Output) -> anyhow::Error {
    if let Some(hint) = err.recovery_suggestion() {
        output.hint(hint);
    }
    err.into()
}
