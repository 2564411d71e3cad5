//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/zotroam/config.toml)
//! 3. Environment variables (ZOTROAM_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Library;

/// Environment variable prefix
const ENV_PREFIX: &str = "ZOTROAM";

/// Default Zotero Web API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.zotero.org";

/// Keys accepted by [`Config::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "data_dir",
    "api_base_url",
    "api_key",
    "profile",
    "libraries",
    "roam_pages",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for the snapshot cache
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Web API endpoint
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Web API key, required for private libraries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request identity; snapshots of different profiles never mix
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Library paths to sync, e.g. `users/123` or `groups/456`
    #[serde(default)]
    pub libraries: Vec<String>,

    /// JSON export of Roam page refs used for tag suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roam_pages: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_base_url: default_api_base_url(),
            api_key: None,
            profile: default_profile(),
            libraries: Vec::new(),
            roam_pages: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(val) = env_var("DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Some(val) = env_var("API_BASE_URL") {
            if !val.is_empty() {
                self.api_base_url = val;
            }
        }
        if let Some(val) = env_var("API_KEY") {
            self.api_key = non_empty(val);
        }
        if let Some(val) = env_var("PROFILE") {
            if !val.is_empty() {
                self.profile = val;
            }
        }
        if let Some(val) = env_var("LIBRARIES") {
            self.libraries = split_list(&val);
        }
        if let Some(val) = env_var("ROAM_PAGES") {
            self.roam_pages = non_empty(val).map(PathBuf::from);
        }
    }

    /// Set a value by key, as done by `config set`
    ///
    /// `""` or `"none"` clears optional keys. `libraries` takes a
    /// comma-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = || non_empty(value.to_string()).filter(|v| v != "none");

        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "api_base_url" => {
                if value.is_empty() {
                    bail!("api_base_url cannot be empty");
                }
                self.api_base_url = value.trim_end_matches('/').to_string();
            }
            "api_key" => self.api_key = optional(),
            "profile" => {
                if value.is_empty() {
                    bail!("profile cannot be empty");
                }
                self.profile = value.to_string();
            }
            "libraries" => self.libraries = split_list(value),
            "roam_pages" => self.roam_pages = optional().map(PathBuf::from),
            "log_file" => self.log_file = optional().map(PathBuf::from),
            _ => bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with ZOTROAM_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Some(path) = env_var("CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zotroam")
            .join("config.toml")
    }

    /// Directory holding one snapshot file per cache key
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// Configured libraries, tagged with the request identity
    pub fn libraries(&self) -> Vec<Library> {
        self.libraries
            .iter()
            .map(|path| Library::new(path.as_str(), self.profile.as_str()))
            .collect()
    }

    /// Look up a configured library, or any library when `path` is explicit
    ///
    /// With no path the single configured library is used; zero or several
    /// configured libraries need an explicit path.
    pub fn library(&self, path: Option<&str>) -> Result<Library> {
        if let Some(path) = path {
            validate_library_path(path)?;
            return Ok(Library::new(path, self.profile.as_str()));
        }

        match self.libraries.as_slice() {
            [only] => Ok(Library::new(only.as_str(), self.profile.as_str())),
            [] => bail!(
                "No library configured. Set one with:\n  \
                 zotroam config set libraries users/<id>"
            ),
            _ => bail!(
                "Several libraries configured ({}); pick one with --library",
                self.libraries.join(", ")
            ),
        }
    }
}

/// Check that a library path looks like `users/<id>` or `groups/<id>`
pub fn validate_library_path(path: &str) -> Result<()> {
    match path.split_once('/') {
        Some(("users" | "groups", id)) if !id.is_empty() && !id.contains('/') => Ok(()),
        _ => bail!(
            "Invalid library path '{}': expected users/<id> or groups/<id>",
            path
        ),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zotroam")
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_profile() -> String {
    "default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Serializes tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "ZOTROAM_DATA_DIR",
        "ZOTROAM_API_BASE_URL",
        "ZOTROAM_API_KEY",
        "ZOTROAM_PROFILE",
        "ZOTROAM_LIBRARIES",
        "ZOTROAM_ROAM_PAGES",
        "ZOTROAM_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api.zotero.org");
        assert_eq!(config.profile, "default");
        assert!(config.api_key.is_none());
        assert!(config.libraries.is_empty());
        assert!(config.data_dir.ends_with("zotroam"));
        assert!(config.cache_dir().ends_with("zotroam/cache"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZOTROAM_DATA_DIR", "/tmp/zotroam-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/zotroam-test"));
    }

    #[test]
    fn test_env_override_libraries() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZOTROAM_LIBRARIES", "users/1, groups/2,,");
        config.apply_env_overrides();

        assert_eq!(config.libraries, vec!["users/1", "groups/2"]);
    }

    #[test]
    fn test_env_override_api_key() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("ZOTROAM_API_KEY", "secret");
        config.apply_env_overrides();
        assert_eq!(config.api_key.as_deref(), Some("secret"));

        // Empty string clears it
        env::set_var("ZOTROAM_API_KEY", "");
        config.apply_env_overrides();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_takes_precedence_over_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("ZOTROAM_PROFILE", "work");
        let config = Config::load_from_str(
            r#"
            profile = "home"
            libraries = ["users/1"]
        "#,
        )
        .unwrap();

        assert_eq!(config.profile, "work");
        assert_eq!(config.libraries(), vec![Library::new("users/1", "work")]);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(
            r#"
            data_dir = "/custom/data"
            api_base_url = "http://localhost:8080"
            api_key = "k"
            libraries = ["users/1", "groups/2"]
            roam_pages = "/custom/pages.json"
        "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.libraries.len(), 2);
        assert_eq!(config.roam_pages, Some(PathBuf::from("/custom/pages.json")));
        assert_eq!(config.profile, "default");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("ZOTROAM_DATA_DIR", temp_dir.path().join("data"));

        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();

        assert!(config.libraries.is_empty());
        assert!(temp_dir.path().join("data").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Default::default()
        };
        config.set("libraries", "users/7,groups/9").unwrap();
        config.set("api_key", "abc").unwrap();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set() {
        let mut config = Config::default();

        config.set("api_base_url", "http://localhost:1234/").unwrap();
        assert_eq!(config.api_base_url, "http://localhost:1234");

        config.set("roam_pages", "/tmp/pages.json").unwrap();
        assert!(config.roam_pages.is_some());
        config.set("roam_pages", "none").unwrap();
        assert!(config.roam_pages.is_none());

        assert!(config.set("profile", "").is_err());
        let err = config.set("sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_library_selection() {
        let mut config = Config::default();
        assert!(config.library(None).is_err());

        config.libraries = vec!["users/1".to_string()];
        assert_eq!(
            config.library(None).unwrap(),
            Library::new("users/1", "default")
        );

        config.libraries.push("groups/2".to_string());
        assert!(config.library(None).is_err());
        assert_eq!(config.library(Some("groups/2")).unwrap().path, "groups/2");
        assert!(config.library(Some("teams/2")).is_err());
    }

    #[test]
    fn test_validate_library_path() {
        assert!(validate_library_path("users/123").is_ok());
        assert!(validate_library_path("groups/4").is_ok());
        assert!(validate_library_path("users/").is_err());
        assert!(validate_library_path("users/1/items").is_err());
        assert!(validate_library_path("123").is_err());
    }
}
