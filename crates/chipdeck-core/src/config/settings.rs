use crate::Result;
use crate::cache::DEFAULT_CAPACITY;
use chipdeck_types::{ChipConfig, UserContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    /// User exposed to templates as `user`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,

    #[serde(default)]
    pub chips: Vec<ChipConfig>,
}

impl Config {
    /// Load config from file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_config_issues(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Number of chip fields across all chips that hold a template.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.chips
            .iter()
            .map(|chip| chip.template_fields().count())
            .sum()
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Configurations kept; 0 disables the cache
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Template backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl BackendConfig {
    /// Configured socket, or `chipdeck.sock` in the runtime directory.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| super::runtime_dir().join("chipdeck.sock"))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
