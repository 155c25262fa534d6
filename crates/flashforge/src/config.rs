//! Configuration management for flashforge.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::DEFAULT_SLOT_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "flashforge";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "deck.db";

/// Default per-slot size limit, in line with browser local-storage quotas.
const DEFAULT_MAX_SLOT_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLASHFORGE_`)
/// 2. TOML config file at `~/.config/flashforge/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Suggestion service configuration.
    pub suggest: SuggestConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the slot database file.
    /// Defaults to `~/.local/share/flashforge/deck.db`
    pub database_path: Option<PathBuf>,
    /// Slot key the deck is stored under.
    pub slot_key: String,
    /// Maximum size of the stored deck in bytes.
    /// Set to 0 for unlimited.
    pub max_slot_bytes: usize,
}

/// Suggestion service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Allow suggestion calls at all.
    pub enabled: bool,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Environment variable holding the provider API key.
    pub api_key_env: String,
    /// Upper bound on generated tokens per suggestion.
    pub max_tokens: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            max_slot_bytes: DEFAULT_MAX_SLOT_BYTES,
        }
    }
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 512,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// defaults, the TOML file (if it exists), `FLASHFORGE_` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLASHFORGE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.slot_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.slot_key must not be empty".to_string(),
            });
        }

        let endpoint = self.suggest.endpoint.as_str();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("suggest.endpoint must be an http(s) URL: {endpoint}"),
            });
        }

        if self.suggest.model.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "suggest.model must not be empty".to_string(),
            });
        }

        if self.suggest.max_tokens == 0 {
            return Err(Error::ConfigValidation {
                message: "suggest.max_tokens must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the slot size limit, if any.
    #[must_use]
    pub fn slot_quota(&self) -> Option<usize> {
        match self.storage.max_slot_bytes {
            0 => None,
            limit => Some(limit),
        }
    }

    /// Read the suggestion API key from the configured environment variable.
    #[must_use]
    pub fn suggest_api_key(&self) -> Option<String> {
        std::env::var(&self.suggest.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.suggest.enabled);
        assert_eq!(config.storage.slot_key, "flashforge-deck");
        assert!(config.storage.database_path.is_none());
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.database_path.is_none());
        assert_eq!(storage.slot_key, DEFAULT_SLOT_KEY);
        assert_eq!(storage.max_slot_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_default_suggest_config() {
        let suggest = SuggestConfig::default();

        assert!(suggest.enabled);
        assert!(suggest.endpoint.starts_with("https://"));
        assert_eq!(suggest.model, "gpt-4o-mini");
        assert_eq!(suggest.api_key_env, "OPENAI_API_KEY");
        assert_eq!(suggest.max_tokens, 512);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_slot_key() {
        let mut config = Config::default();
        config.storage.slot_key = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("slot_key"));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.suggest.endpoint = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("suggest.endpoint"));
    }

    #[test]
    fn test_validate_empty_model() {
        let mut config = Config::default();
        config.suggest.model = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("suggest.model"));
    }

    #[test]
    fn test_validate_zero_max_tokens() {
        let mut config = Config::default();
        config.suggest.max_tokens = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_tokens"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("deck.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/cards.db"));

        assert_eq!(config.database_path(), PathBuf::from("/custom/path/cards.db"));
    }

    #[test]
    fn test_slot_quota() {
        let mut config = Config::default();
        assert_eq!(config.slot_quota(), Some(5 * 1024 * 1024));

        config.storage.max_slot_bytes = 0;
        assert_eq!(config.slot_quota(), None);
    }

    #[test]
    fn test_suggest_api_key_missing() {
        let mut config = Config::default();
        config.suggest.api_key_env = "FLASHFORGE_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(config.suggest_api_key().is_none());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flashforge"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("flashforge"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "flashforge_config_{}_{}.toml",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(
            &path,
            "[storage]\nslot_key = \"biology\"\nmax_slot_bytes = 0\n\n[suggest]\nenabled = false\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.storage.slot_key, "biology");
        assert_eq!(config.slot_quota(), None);
        assert!(!config.suggest.enabled);
        assert_eq!(config.suggest.model, "gpt-4o-mini");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_toml_value_rejected() {
        let path = std::env::temp_dir().join(format!(
            "flashforge_bad_config_{}_{}.toml",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::write(&path, "[suggest]\nmax_tokens = 0\n").unwrap();

        let err = Config::load_from(Some(path.clone())).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"slot_key": "spanish", "max_slot_bytes": 1024}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.slot_key, "spanish");
        assert_eq!(storage.max_slot_bytes, 1024);
        assert!(storage.database_path.is_none());
    }

    #[test]
    fn test_suggest_config_serialize() {
        let json = serde_json::to_string(&SuggestConfig::default()).unwrap();
        assert!(json.contains("api_key_env"));
        assert!(json.contains("max_tokens"));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        assert_eq!(config.clone(), config);
    }
}
