//! Status command handler

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use zotroam_core::{Config, DataType, RecordType};

use super::{open_syncer, target_libraries};
use crate::output::{Output, OutputFormat};

/// Cached state of one `(library, data type)` snapshot
#[derive(Debug, Serialize)]
struct SnapshotStatus {
    library: String,
    #[serde(rename = "type")]
    data_type: DataType,
    version: Option<u64>,
    count: usize,
    fetched_at: Option<DateTime<Utc>>,
}

/// Show cached versions and counts, without touching the network
pub fn show(config: &Config, output: &Output) -> Result<()> {
    let libraries = if config.libraries.is_empty() {
        Vec::new()
    } else {
        target_libraries(config, None)?
    };
    let syncer = open_syncer(config)?;

    let mut rows = Vec::new();
    for library in &libraries {
        for record_type in [RecordType::Items, RecordType::Collections] {
            let snapshot = syncer.cached(library, record_type)?;
            rows.push(SnapshotStatus {
                library: library.path.clone(),
                data_type: record_type.into(),
                version: snapshot.as_ref().map(|s| s.last_updated),
                count: snapshot.as_ref().map_or(0, |s| s.len()),
                fetched_at: snapshot.and_then(|s| s.fetched_at),
            });
        }
        let tags = syncer.cached_tags(library)?;
        rows.push(SnapshotStatus {
            library: library.path.clone(),
            data_type: DataType::Tags,
            version: tags.as_ref().map(|s| s.last_updated),
            count: tags.as_ref().map_or(0, |s| s.len()),
            fetched_at: tags.and_then(|s| s.fetched_at),
        });
    }

    match output.format {
        OutputFormat::Json => {
            output.print_json(&serde_json::json!({
                "profile": config.profile,
                "api_base_url": config.api_base_url,
                "cache_dir": config.cache_dir(),
                "snapshots": rows,
            }));
        }
        OutputFormat::Quiet => {
            for row in &rows {
                println!(
                    "{} {} {}",
                    row.library,
                    row.data_type,
                    row.version.unwrap_or_default()
                );
            }
        }
        OutputFormat::Human => {
            println!("zotroam Status");
            println!("==============");
            println!();
            println!("Web API:  {}", config.api_base_url);
            println!("Profile:  {}", config.profile);
            println!("Cache:    {}", config.cache_dir().display());
            println!();

            if rows.is_empty() {
                println!("No libraries configured.");
                return Ok(());
            }

            let mut current = "";
            for row in &rows {
                if row.library != current {
                    println!("{}:", row.library);
                    current = &row.library;
                }
                match row.version {
                    Some(version) => println!(
                        "  {:<12} {:>6} at version {:<8} {}",
                        row.data_type.to_string(),
                        row.count,
                        version,
                        row.fetched_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default()
                    ),
                    None => println!("  {:<12} never synced", row.data_type.to_string()),
                }
            }
        }
    }

    Ok(())
}
