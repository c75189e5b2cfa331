//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

const MAX_SNAPSHOT_BYTES: usize = 512 * 1024 * 1024;
const MAX_ENTRY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `catalog_url`, `catalog_entry`, `collection` or `user_agent` is blank
    /// - `max_bytes` is 0 or exceeds 512MB
    /// - `max_entry_bytes` is 0 or exceeds 2GB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_url.trim().is_empty() {
            return Err(invalid("catalog_url", "must not be empty"));
        }
        if self.catalog_entry.trim().is_empty() {
            return Err(invalid("catalog_entry", "must not be empty"));
        }
        if self.collection.trim().is_empty() {
            return Err(invalid("collection", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > MAX_SNAPSHOT_BYTES {
            return Err(invalid("max_bytes", "must not exceed 512MB"));
        }

        if self.max_entry_bytes == 0 {
            return Err(invalid("max_entry_bytes", "must be greater than 0"));
        }
        if self.max_entry_bytes > MAX_ENTRY_BYTES {
            return Err(invalid("max_entry_bytes", "must not exceed 2GB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if (self.max_bytes as u64) > self.max_entry_bytes {
            tracing::warn!(
                max_bytes = self.max_bytes,
                max_entry_bytes = self.max_entry_bytes,
                "max_entry_bytes is smaller than max_bytes; large catalogs may fail to unpack"
            );
        }

        Ok(())
    }
}
