//! Config command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use zotroam_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let api_key = config.api_key.as_deref().map(mask);

    match output.format {
        OutputFormat::Json => {
            output.print_json(&serde_json::json!({
                "data_dir": config.data_dir,
                "api_base_url": config.api_base_url,
                "api_key": api_key,
                "profile": config.profile,
                "libraries": config.libraries,
                "roam_pages": config.roam_pages,
                "log_file": config.log_file,
            }));
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            let libraries = if config.libraries.is_empty() {
                "(not set)".to_string()
            } else {
                config.libraries.join(", ")
            };

            println!("Configuration:");
            println!("  data_dir:     {}", config.data_dir.display());
            println!("  api_base_url: {}", config.api_base_url);
            println!(
                "  api_key:      {}",
                api_key.as_deref().unwrap_or("(not set)")
            );
            println!("  profile:      {}", config.profile);
            println!("  libraries:    {}", libraries);
            println!("  roam_pages:   {}", display_path(&config.roam_pages));
            println!("  log_file:     {}", display_path(&config.log_file));
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value and save it
pub fn set(key: &str, value: &str, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    config.set(key, value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "api_key" {
        mask(value)
    } else {
        value.to_string()
    };
    output.success(&format!("Set {} = {}", key, shown));
    Ok(())
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Hide all but the last four characters of a secret
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
