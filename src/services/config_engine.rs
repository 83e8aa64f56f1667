// raindrop-sync Config Engine
// Loads, validates, edits and persists `SyncConfig` as a JSON file.
// The file lives at the platform config path unless an explicit path is given.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform;
use crate::types::config::{SyncConfig, API_MAX_PAGE_SIZE};
use crate::types::errors::ConfigError;

/// Trait defining the config engine interface.
pub trait ConfigEngineTrait {
    fn load(&mut self) -> Result<SyncConfig, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn get_config(&self) -> &SyncConfig;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError>;
    fn reset(&mut self) -> Result<(), ConfigError>;
    fn get_config_path(&self) -> &Path;
}

/// Config engine that persists configuration as JSON on disk.
pub struct ConfigEngine {
    config_path: PathBuf,
    config: SyncConfig,
}

impl ConfigEngine {
    /// Creates a new ConfigEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses `config.json` in the platform config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("config.json"));

        Self {
            config_path,
            config: SyncConfig::default(),
        }
    }
}

/// Rejects configurations the fetch client or store cannot work with.
pub fn validate(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must not be empty".to_string()));
    }
    if config.api.page_size == 0 || config.api.page_size > API_MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid(format!(
            "api.page_size must be between 1 and {}, got {}",
            API_MAX_PAGE_SIZE, config.api.page_size
        )));
    }
    if config.api.max_pages == 0 {
        return Err(ConfigError::Invalid("api.max_pages must be at least 1".to_string()));
    }
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.store.snapshot_dir.as_os_str().is_empty()
        || config.store.pointer_path.as_os_str().is_empty()
    {
        return Err(ConfigError::Invalid(
            "store.snapshot_dir and store.pointer_path must be set".to_string(),
        ));
    }
    Ok(())
}

impl ConfigEngineTrait for ConfigEngine {
    /// Loads configuration from the JSON file.
    ///
    /// A missing file yields defaults. A malformed or invalid file is an error.
    fn load(&mut self) -> Result<SyncConfig, ConfigError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "No config file, using defaults");
            self.config = SyncConfig::default();
            return Ok(self.config.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::Io(format!("Failed to read config file: {}", e)))?;

        let config: SyncConfig = serde_json::from_str(&content).map_err(|e| {
            ConfigError::Serialization(format!("Failed to parse config file: {}", e))
        })?;
        validate(&config)?;

        self.config = config;
        Ok(self.config.clone())
    }

    /// Saves the current configuration, creating parent directories as needed.
    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&self.config_path, json)
            .map_err(|e| ConfigError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_config(&self) -> &SyncConfig {
        &self.config
    }

    /// Updates one value by dot-notation key path, e.g. `"api.page_size"`.
    ///
    /// The change is applied to a JSON view of the config, deserialized back
    /// into `SyncConfig` and validated before anything is saved.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::InvalidKey("Key cannot be empty".to_string()));
        }

        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.config).map_err(|e| {
            ConfigError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                let map = match current {
                    serde_json::Value::Object(map) => map,
                    _ => {
                        return Err(ConfigError::InvalidKey(format!(
                            "Cannot navigate to key '{}': intermediate value is not an object",
                            key
                        )));
                    }
                };
                if !map.contains_key(*part) {
                    return Err(ConfigError::InvalidKey(format!(
                        "Key '{}' not found in config",
                        key
                    )));
                }
                if i == parts.len() - 1 {
                    map.insert(part.to_string(), value.clone());
                    break;
                }
                current = match map.get_mut(*part) {
                    Some(v) => v,
                    None => {
                        return Err(ConfigError::InvalidKey(format!(
                            "Key '{}' not found in config",
                            key
                        )));
                    }
                };
            }
        }

        let new_config: SyncConfig = serde_json::from_value(json_value).map_err(|e| {
            ConfigError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_config)?;

        self.config = new_config;
        self.save()?;

        Ok(())
    }

    /// Resets to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), ConfigError> {
        self.config = SyncConfig::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
