//! Durable persistence of the connection registry
//!
//! This module provides the `ConnectionStore` which handles loading and saving
//! the registry blob and the application settings as TOML files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::models::Registry;

use super::settings::AppSettings;

/// File names for store files
const CONNECTIONS_FILE: &str = "connections.toml";
const CONFIG_FILE: &str = "config.toml";

/// Wrapper for serializing the registry under its namespace key
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct RegistryFile {
    #[serde(default)]
    connections: Registry,
}

/// Persistence boundary for the connection registry
///
/// Loads and saves the whole registry as a single keyed blob; there are no
/// partial-key writes. Every mutation path is load, modify, save. Stored in
/// `~/.config/fluxconn/` by default.
#[derive(Debug, Clone)]
pub struct ConnectionStore {
    /// Base directory for store files
    config_dir: PathBuf,
}

impl ConnectionStore {
    /// Creates a new `ConnectionStore` with the default configuration directory
    ///
    /// The default directory is `~/.config/fluxconn/`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> StoreResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("~/.config")))?
            .join("fluxconn");
        Ok(Self { config_dir })
    }

    /// Creates a new `ConnectionStore` with a custom configuration directory
    ///
    /// This is useful for testing or non-standard configurations.
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Ensures the configuration directory exists
    fn ensure_config_dir(&self) -> StoreResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                StoreError::Write(format!(
                    "Failed to create config directory {}: {}",
                    self.config_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    // ========== Registry ==========

    /// Loads the registry from the store
    ///
    /// Returns `None` if no registry has ever been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> StoreResult<Option<Registry>> {
        let path = self.config_dir.join(CONNECTIONS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_toml_file::<RegistryFile>(&path).map(|f| Some(f.connections))
    }

    /// Saves the full registry to the store
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, registry: &Registry) -> StoreResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(CONNECTIONS_FILE);
        let file = RegistryFile {
            connections: registry.clone(),
        };
        Self::save_toml_file(&path, &file)
    }

    // ========== Application Settings ==========

    /// Loads application settings
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_settings(&self) -> StoreResult<AppSettings> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(AppSettings::default());
        }
        Self::load_toml_file(&path)
    }

    /// Saves application settings
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_settings(&self, settings: &AppSettings) -> StoreResult<()> {
        self.ensure_config_dir()?;
        let path = self.config_dir.join(CONFIG_FILE);
        Self::save_toml_file(&path, settings)
    }

    // ========== Generic TOML Operations ==========

    /// Loads and parses a TOML file
    fn load_toml_file<T>(path: &Path) -> StoreResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::Read(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| {
            StoreError::Deserialize(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Saves data to a TOML file
    fn save_toml_file<T>(path: &Path, data: &T) -> StoreResult<()>
    where
        T: serde::Serialize,
    {
        let content = toml::to_string_pretty(data)
            .map_err(|e| StoreError::Serialize(format!("Failed to serialize: {e}")))?;

        fs::write(path, content)
            .map_err(|e| StoreError::Write(format!("Failed to write {}: {}", path.display(), e)))
    }
}
