//! zotroam CLI
//!
//! Command-line interface for zotroam - Zotero library sync and tag cleanup.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zotroam_core::Config;

mod commands;
mod output;

use commands::sync::SyncTarget;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "zotroam")]
#[command(about = "zotroam - Zotero library sync and tag cleanup")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync libraries with the Zotero Web API
    Sync {
        /// Library path (users/<id> or groups/<id>); all configured if omitted
        #[arg(short, long)]
        library: Option<String>,
        /// Only sync one data type
        #[arg(short = 't', long = "type", value_enum)]
        data_type: Option<SyncTarget>,
    },
    /// Show tag merge suggestions
    Tags {
        /// Library path; the configured one if omitted
        #[arg(short, long, global = true)]
        library: Option<String>,
        #[command(subcommand)]
        command: Option<TagCommands>,
    },
    /// Show cached snapshot versions and counts
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags with item counts
    #[command(alias = "ls")]
    List,
    /// Delete tags from every item of the library
    #[command(alias = "rm")]
    Delete {
        /// Tags to delete
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, api_base_url, api_key, profile, libraries, roam_pages, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(cli.verbose, config.log_file.as_deref());
    debug!("Loaded configuration for profile '{}'", config.profile);

    match cli.command {
        Commands::Sync { library, data_type } => {
            commands::sync::sync(&config, library.as_deref(), data_type, &output).await
        }
        Commands::Tags { library, command } => {
            let library = library.as_deref();
            match command {
                None => commands::tag::suggestions(&config, library, &output).await,
                Some(TagCommands::List) => commands::tag::list(&config, library, &output).await,
                Some(TagCommands::Delete { tags }) => {
                    commands::tag::delete(&config, library, tags, &output).await
                }
            }
        }
        Commands::Status => commands::status::show(&config, &output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, config_path, &output)
            }
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(&key, &value, config_path, &output)
            }
        },
    }
}

/// Initialize logging
///
/// `ZOTROAM_LOG` takes a full `EnvFilter` directive (`debug`,
/// `zotroam_core=trace,reqwest=debug`) and replaces the filter picked from
/// `--verbose`. Logs go to `log_file` when configured, otherwise to stderr so
/// stdout stays parseable.
fn init_logging(verbose: u8, log_file: Option<&Path>) {
    let env_filter = match std::env::var("ZOTROAM_LOG") {
        Ok(directives) => EnvFilter::try_new(&directives).unwrap_or_else(|e| {
            eprintln!("Warning: Ignoring invalid ZOTROAM_LOG {:?}: {}", directives, e);
            EnvFilter::new(default_directives(verbose))
        }),
        Err(_) => EnvFilter::new(default_directives(verbose)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    // Ignore the error if a subscriber is already installed
    match log_file {
        Some(path) => match File::create(path) {
            Ok(file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", path, e);
                let _ = builder.with_writer(std::io::stderr).try_init();
            }
        },
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}

/// Filter used when `ZOTROAM_LOG` is unset or invalid
fn default_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("zotroam_core={},zotroam_cli={}", level, level)
}
