//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;
use serde_json::json;

use zotroam_core::sync::{SyncDelta, SyncOutcome};
use zotroam_core::tags::{BucketSuggestions, MergeType};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }

    /// Print the outcome of every finished sync cycle
    pub fn print_sync_outcomes(&self, outcomes: &[SyncOutcome]) {
        match self.format {
            OutputFormat::Human => {
                if outcomes.is_empty() {
                    println!("Nothing synced.");
                    return;
                }
                for outcome in outcomes {
                    println!("{}", outcome_line(outcome));
                }
            }
            OutputFormat::Json => {
                let rows: Vec<_> = outcomes.iter().map(outcome_json).collect();
                self.print_json(&rows);
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print tag merge suggestions
    ///
    /// Human and quiet output only list clusters that need a merge.
    pub fn print_suggestions(&self, buckets: &[BucketSuggestions]) {
        match self.format {
            OutputFormat::Human => {
                let mut pending = 0;
                for bucket in buckets {
                    let actionable: Vec<_> = bucket
                        .entries
                        .iter()
                        .filter(|e| e.suggestion.merge_type.is_some())
                        .collect();
                    if actionable.is_empty() {
                        continue;
                    }

                    println!("── {} ──", bucket.bucket);
                    for entry in actionable {
                        let s = &entry.suggestion;
                        let kind = match s.merge_type {
                            Some(MergeType::Auto) => "auto",
                            _ => "manual",
                        };
                        println!(
                            "{} [{}] -> {}",
                            entry.entry.token,
                            kind,
                            s.recommend.as_deref().unwrap_or("(choose)")
                        );
                        if !s.uses.roam.is_empty() {
                            println!("    roam:   {}", truncate(&s.uses.roam.join(", "), 70));
                        }
                        if !s.uses.zotero.is_empty() {
                            println!("    zotero: {}", truncate(&s.uses.zotero.join(", "), 70));
                        }
                        pending += 1;
                    }
                }
                if pending == 0 {
                    println!("No tags to merge.");
                } else {
                    println!("\n{} tag cluster(s) to merge", pending);
                }
            }
            OutputFormat::Json => self.print_json(buckets),
            OutputFormat::Quiet => {
                for entry in buckets.iter().flat_map(|b| &b.entries) {
                    if entry.suggestion.merge_type.is_some() {
                        println!("{}", entry.entry.token);
                    }
                }
            }
        }
    }

    /// Print a list of tags with their item counts
    pub fn print_tags(&self, tags: &[(String, u64)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let rows: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| json!({"name": name, "count": count}))
                    .collect();
                self.print_json(&rows);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", json!({"status": "success", "message": message}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a hint on stderr so JSON on stdout stays parseable
    pub fn hint(&self, hint: &str) {
        if !self.is_quiet() {
            eprintln!("Hint: {}", hint);
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => println!("{}", json!({"message": msg})),
            OutputFormat::Quiet => {}
        }
    }
}

fn delta_counts(outcome: &SyncOutcome) -> (usize, usize) {
    match &outcome.data {
        Some(SyncDelta::Records { modified, deleted }) => (modified.len(), deleted.len()),
        Some(SyncDelta::Tags(tags)) => (tags.len(), 0),
        None => (0, 0),
    }
}

fn outcome_line(outcome: &SyncOutcome) -> String {
    let target = format!("{} of {}", outcome.data_type, outcome.library_path);
    if !outcome.success {
        return format!(
            "✗ {}: {}",
            target,
            outcome.error.as_deref().unwrap_or("failed")
        );
    }

    let (modified, deleted) = delta_counts(outcome);
    let version = outcome.version.unwrap_or_default();
    match &outcome.data {
        Some(SyncDelta::Tags(_)) => format!("✓ {}: {} tag(s) at version {}", target, modified, version),
        _ => format!(
            "✓ {}: {} changed, {} deleted, at version {}",
            target, modified, deleted, version
        ),
    }
}

fn outcome_json(outcome: &SyncOutcome) -> serde_json::Value {
    let (modified, deleted) = delta_counts(outcome);
    json!({
        "type": outcome.data_type,
        "library": outcome.library_path,
        "success": outcome.success,
        "version": outcome.version,
        "modified": modified,
        "deleted": deleted,
        "error": outcome.error,
    })
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
