//! Configuration management for the modem client

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{DEFAULT_HOST, DEFAULT_TIMEOUT_SECS};

/// Modem client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    /// Modem IP address or hostname
    #[serde(default = "default_host")]
    pub host: String,

    /// Admin password (the modem's "key")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Function scanner options
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Function scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// First getter function to probe
    #[serde(default = "default_scan_start")]
    pub start: u32,

    /// Directory receiving `func_<n>.xml` files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_scan_start() -> u32 {
    1
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            start: default_scan_start(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            password: None,
            timeout_secs: default_timeout(),
            scan: ScanConfig::default(),
        }
    }
}

impl ModemConfig {
    /// Create a configuration for `host` with an optional password
    pub fn new(host: impl Into<String>, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            password,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {e}", path.display()))
        })?;

        let config: ModemConfig = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!("failed to parse config file {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize configuration: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host cannot be empty"));
        }
        if self.host.contains('/') {
            return Err(Error::config("host must be an address, not a URL"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout cannot be zero"));
        }
        Ok(())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL of the web interface
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.host)
    }
}
