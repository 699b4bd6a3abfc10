//! Configuration loading
//!
//! Settings come from a TOML file; every section falls back to its defaults
//! when missing. The TMDB API key may also be supplied through the
//! environment so it never has to be written to disk.

use crate::metadata_retrieval::DEFAULT_TMDB_BASE_URL;
use crate::playback::DEFAULT_EMBED_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `tmdb.api_key`.
pub const API_KEY_ENV: &str = "LUNA_STREAM_TMDB_API_KEY";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "luna-stream.toml";

/// Default base for poster and backdrop images.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w1280";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No API key in the config file or the environment
    #[error("No TMDB API key configured (set tmdb.api_key or LUNA_STREAM_TMDB_API_KEY)")]
    MissingApiKey,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub tmdb: TmdbConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub embed_base_url: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            embed_base_url: DEFAULT_EMBED_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Otherwise the file picked by
    /// [`Config::locate`] is used, or the defaults when there is none.
    /// The API key environment variable is applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::locate(explicit) {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key_override(&key);
        }

        Ok(config)
    }

    /// The file [`Config::load`] reads: the explicit path as given, else the
    /// first existing entry of [`Config::config_paths`].
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::config_paths().into_iter().find(|p| p.exists()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Candidate config files in lookup order.
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(dirs) = directories::ProjectDirs::from("app", "lunastream", "luna-stream") {
            paths.push(dirs.config_dir().join("config.toml"));
        }

        paths
    }

    /// Non-blank values replace the configured key.
    fn apply_api_key_override(&mut self, key: &str) {
        let key = key.trim();
        if !key.is_empty() {
            self.tmdb.api_key = key.to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tmdb.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.player.embed_base_url, "https://vidsrc.to/embed");
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tmdb]
            api_key = "abc123"

            [player]
            embed_base_url = "https://player.example/embed"
            "#,
        )
        .unwrap();

        assert_eq!(config.tmdb.api_key, "abc123");
        assert_eq!(config.tmdb.image_base_url, DEFAULT_IMAGE_BASE_URL);
        assert_eq!(config.player.embed_base_url, "https://player.example/embed");
        assert_eq!(config.general, GeneralConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_override() {
        let mut config = Config::default();
        config.apply_api_key_override("  from-env ");
        assert_eq!(config.tmdb.api_key, "from-env");

        config.apply_api_key_override("   ");
        assert_eq!(config.tmdb.api_key, "from-env");
    }

    #[test]
    fn test_locate_keeps_explicit_path_even_if_missing() {
        let path = Path::new("/nonexistent/luna-stream.toml");
        assert_eq!(Config::locate(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/luna-stream.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }
}
