//! Bridge configuration
//!
//! Resolution order, lowest to highest precedence:
//!
//! 1. Built-in defaults (`http://localhost:4001/api`, 30 second timeout)
//! 2. A YAML file, either given explicitly or found at
//!    `<config_dir>/archon-bridge/config.yaml`
//! 3. Environment variables / command-line flags, applied by the binaries
//!    through [`Config::with_overrides`]
//!
//! ```yaml
//! api_base: http://archon.internal:4001/api
//! timeout_secs: 10
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default Archon API base address
pub const DEFAULT_API_BASE: &str = "http://localhost:4001/api";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the API base address
pub const ENV_API_BASE: &str = "ARCHON_API_BASE";

/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "ARCHON_TIMEOUT_SECS";

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the Archon HTTP API (no trailing slash)
    pub api_base: String,
    /// Timeout applied to every outbound request
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.normalized()
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// read if present and silently skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    tracing::debug!("Loading config from {}", default_path.display());
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply environment / command-line overrides on top of this config.
    pub fn with_overrides(
        mut self,
        api_base: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self.normalized()
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn normalized(mut self) -> Result<Self> {
        let base = self.api_base.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::Config("api_base must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_base must be an http(s) URL, got '{}'",
                base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".to_string()));
        }
        self.api_base = base.to_string();
        Ok(self)
    }
}

/// Default config file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("archon-bridge")
        .join("config.yaml")
}
