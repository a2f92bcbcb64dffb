//! Runtime configuration.
//!
//! [`RuntimeConfig`] controls the knobs shared by every render: the default
//! output format, fragment caching, and development-mode template reloads.
//! Every field has a default, so a partial YAML document is enough:
//!
//! ```rust
//! use trellis::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_yaml("development: true\ncache_namespace: shop").unwrap();
//! assert!(config.development);
//! assert_eq!(config.cache_namespace, "shop");
//! assert_eq!(config.default_format, "html");
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a [`RuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Format used when a template file carries none, and for lookups that
    /// don't request a format.
    pub default_format: String,
    /// Enables [`Runtime::reload_templates`](crate::Runtime::reload_templates).
    pub development: bool,
    /// First segment of every fragment cache key.
    pub cache_namespace: String,
    /// Optional deploy-wide version folded into cache keys.
    pub environment_version: Option<String>,
    /// Master switch for fragment caching.
    pub caching_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_format: "html".to_string(),
            development: false,
            cache_namespace: "trellis".to_string(),
            environment_version: None,
            caching_enabled: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_format.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_format must not be empty".to_string(),
            ));
        }
        if self.cache_namespace.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "cache_namespace '{}' must not contain '/'",
                self.cache_namespace
            )));
        }
        Ok(())
    }
}
