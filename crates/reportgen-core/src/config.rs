//! Configuration loading.
//!
//! Configuration lives in an optional YAML file (`reportgen.yml` by default).
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```yaml
//! viewer:
//!   page_size: 200
//!   cache_capacity: 3
//!   fetch_timeout_secs: 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default number of steps per page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Default number of item step sequences kept in the viewer cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

/// Default bound on a single chunk fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub viewer: ViewerConfig,
}

/// Settings for the lazy-load runtime, both in-process and in the browser viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub page_size: usize,
    pub cache_capacity: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl ViewerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl ReportConfig {
    /// Loads configuration from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parses and validates configuration from YAML text.
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewer.page_size == 0 {
            return Err(ConfigError::Invalid(
                "viewer.page_size must be at least 1".to_string(),
            ));
        }
        if self.viewer.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "viewer.cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
