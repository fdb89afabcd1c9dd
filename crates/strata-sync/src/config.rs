//! Client-side configuration: transport settings and named remotes.
//!
//! ```toml
//! [transport]
//! timeout_secs = 30
//! internal_ip = "10.0.0.5"
//!
//! [[remote]]
//! name = "origin"
//! url = "http://geo.example.org/roads"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
    /// Identity sent to the remote as `internalIp`; push sessions are keyed
    /// by it.
    pub internal_ip: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Some(30),
            user_agent: concat!("strata/", env!("CARGO_PKG_VERSION")).to_string(),
            internal_ip: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub transport: TransportConfig,
    #[serde(rename = "remote")]
    pub remotes: Vec<RemoteConfig>,
}

impl SyncConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteConfig> {
        self.remotes.iter().find(|r| r.name == name)
    }
}
