//! Sync command handler

use anyhow::{bail, Result};
use clap::ValueEnum;
use tracing::error;

use zotroam_core::sync::SyncOutcome;
use zotroam_core::{Config, Library, RecordType, SyncEvent, SyncResult, Syncer};

use super::{open_syncer, sync_failure, target_libraries};
use crate::output::Output;

/// Data type selected with `--type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncTarget {
    Items,
    Collections,
    Tags,
}

/// Sync the selected libraries and report every finished cycle
///
/// All libraries are attempted; the command fails afterwards if any cycle did.
pub async fn sync(
    config: &Config,
    library: Option<&str>,
    target: Option<SyncTarget>,
    output: &Output,
) -> Result<()> {
    let libraries = target_libraries(config, library)?;
    let syncer = open_syncer(config)?;

    let mut events = syncer.subscribe();
    let collector = tokio::spawn(async move {
        let mut outcomes = Vec::new();
        while let Some(event) = events.recv().await {
            if let SyncEvent::Completed(outcome) = event {
                outcomes.push(outcome);
            }
        }
        outcomes
    });

    let mut failed = 0;
    for library in &libraries {
        if let Err(e) = sync_one(&syncer, library, target).await {
            error!("{:#}", sync_failure(e, output));
            failed += 1;
        }
    }

    // Dropping the syncer closes the event channel
    drop(syncer);
    let outcomes: Vec<SyncOutcome> = collector.await?;
    output.print_sync_outcomes(&outcomes);

    if failed > 0 {
        bail!("Sync failed for {} of {} libraries", failed, libraries.len());
    }
    Ok(())
}

async fn sync_one(
    syncer: &Syncer,
    library: &Library,
    target: Option<SyncTarget>,
) -> SyncResult<()> {
    match target {
        None => {
            syncer.sync_library(library).await?;
        }
        Some(SyncTarget::Items) => {
            syncer.sync_records(library, RecordType::Items).await?;
        }
        Some(SyncTarget::Collections) => {
            syncer.sync_records(library, RecordType::Collections).await?;
        }
        Some(SyncTarget::Tags) => {
            syncer.sync_tags(library).await?;
        }
    }
    Ok(())
}
