//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELF_*)
//! 2. TOML config file (if SHELF_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELF_*)
/// 2. TOML config file (if SHELF_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store.
    ///
    /// Set via SHELF_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Location of the compressed catalog snapshot.
    ///
    /// `http://` and `https://` values are fetched over the network, anything
    /// else is read from the filesystem. Set via SHELF_CATALOG_URL.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Name of the JSON entry inside the snapshot archive.
    ///
    /// Only consulted when the archive holds more than one file.
    /// Set via SHELF_CATALOG_ENTRY.
    #[serde(default = "default_catalog_entry")]
    pub catalog_entry: String,

    /// Collection the catalog is cached in.
    ///
    /// Set via SHELF_COLLECTION.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELF_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum snapshot bytes to fetch.
    ///
    /// Set via SHELF_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum decompressed bytes read from the catalog entry.
    ///
    /// Set via SHELF_MAX_ENTRY_BYTES environment variable.
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: u64,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELF_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./ebook-shelf.sqlite")
}

fn default_catalog_url() -> String {
    "./ebook-list.json.zip".into()
}

fn default_catalog_entry() -> String {
    "ebook-list.json".into()
}

fn default_collection() -> String {
    "book-list".into()
}

fn default_user_agent() -> String {
    "ebook-shelf/0.1".into()
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_max_entry_bytes() -> u64 {
    256 * 1024 * 1024
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            catalog_url: default_catalog_url(),
            catalog_entry: default_catalog_entry(),
            collection: default_collection(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            max_entry_bytes: default_max_entry_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELF_`
    /// 2. TOML file from `SHELF_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELF_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELF_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Whether the catalog location is a network URL rather than a path.
    pub fn catalog_is_remote(&self) -> bool {
        let lower = self.catalog_url.trim().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}
