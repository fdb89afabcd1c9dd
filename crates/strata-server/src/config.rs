use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest object accepted by `sendobject`, in bytes.
    pub max_object_size: u64,
    /// Serve a shallow clone of this depth.
    pub shallow_depth: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8182)),
            max_object_size: 16 * 1024 * 1024,
            shallow_depth: None,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8182".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_object_size, 16 * 1024 * 1024);
        assert!(c.shallow_depth.is_none());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let c = ServerConfig::from_toml_str("shallow_depth = 3").unwrap();
        assert_eq!(c.shallow_depth, Some(3));
        assert_eq!(c.max_object_size, ServerConfig::default().max_object_size);
    }

    #[test]
    fn bad_address_is_a_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = \"nowhere\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = \"0.0.0.0:9000\"\nmax_object_size = 1024").unwrap();
        let c = ServerConfig::load(file.path()).unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.max_object_size, 1024);
    }
}
