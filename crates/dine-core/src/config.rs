//! Configuration structures for the dine client.
//!
//! This module provides configuration types for the on-device state:
//!
//! - [`StorageConfig`] - Where the persisted key-value file lives
//! - [`FavoritesConfig`] - Favorites key and write/notify ordering
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`], and every section is
//! `#[serde(default)]` so a partial JSON file only overrides what it names.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default key under which the favorites list is persisted.
pub const DEFAULT_FAVORITES_KEY: &str = "@restaurant_favorites";

/// Ordering between the persisted write and the listener broadcast after a
/// favorites mutation.
///
/// # Examples
///
/// ```
/// use dine_core::WriteOrder;
///
/// assert_eq!(WriteOrder::default(), WriteOrder::AwaitWriteThenNotify);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrder {
    /// Wait for the persisted write to finish, then notify listeners.
    ///
    /// Listeners never observe a state that has not reached the store.
    #[default]
    AwaitWriteThenNotify,

    /// Notify listeners first, then write to the store.
    NotifyThenWrite,
}

/// Configuration for the persisted key-value store.
///
/// # Examples
///
/// ```
/// use dine_core::StorageConfig;
///
/// let config = StorageConfig::default();
/// assert_eq!(config.store_path().as_str(), ".dine/store.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the store file.
    pub data_dir: Utf8PathBuf,

    /// File name of the JSON store inside `data_dir`.
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from(".dine"),
            file_name: "store.json".to_owned(),
        }
    }
}

impl StorageConfig {
    /// Returns the full path of the store file.
    #[must_use]
    pub fn store_path(&self) -> Utf8PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Configuration for the favorites cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Key under which the favorites list is persisted.
    pub storage_key: String,

    /// Ordering between the persisted write and the broadcast.
    pub write_order: WriteOrder,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_FAVORITES_KEY.to_owned(),
            write_order: WriteOrder::default(),
        }
    }
}

/// Root configuration for the dine client.
///
/// # Examples
///
/// ```
/// use dine_core::Config;
///
/// let config = Config::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.favorites.storage_key, "@restaurant_favorites");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persisted store configuration.
    pub storage: StorageConfig,

    /// Favorites cache configuration.
    pub favorites: FavoritesConfig,
}

impl Config {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing sections and fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON for this schema, or
    /// [`ConfigError::InvalidOption`] if validation fails.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an empty favorites key or a
    /// store file name that is empty or contains a path separator, and
    /// [`ConfigError::InvalidPath`] if the data directory exists but is not a
    /// directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.favorites.storage_key.trim().is_empty() {
            return Err(ConfigError::invalid_option(
                "favorites.storage_key",
                "must not be empty",
            ));
        }
        let file_name = self.storage.file_name.trim();
        if file_name.is_empty() {
            return Err(ConfigError::invalid_option(
                "storage.file_name",
                "must not be empty",
            ));
        }
        if file_name.contains(['/', '\\']) {
            return Err(ConfigError::invalid_option(
                "storage.file_name",
                "must be a bare file name",
            ));
        }
        if self.storage.data_dir.exists() && !self.storage.data_dir.is_dir() {
            return Err(ConfigError::invalid_path(
                &self.storage.data_dir,
                "not a directory",
            ));
        }
        Ok(())
    }
}
