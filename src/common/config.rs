//! # Configuration Utilities
//!
//! Shared configuration structures and parsing utilities used by both
//! client and server components.

use std::net::{Ipv4Addr, SocketAddrV4};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: ServerConfig = load_config("config/server.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Multicast group used for administrator notes.
///
/// Server and clients must agree on `group` and `port`; `ttl` only matters to
/// the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// IPv4 multicast group address (e.g., 224.1.1.1)
    pub group: Ipv4Addr,
    /// UDP port listeners bind to
    pub port: u16,
    /// Multicast time-to-live; 1 keeps notes on the local segment
    pub ttl: u32,
}

impl BroadcastConfig {
    pub fn target(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.group, self.port)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(224, 1, 1, 1),
            port: 50008,
            ttl: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        broadcast: BroadcastConfig,
    }

    #[test]
    fn test_load_config_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broadcast]\nport = 6000").unwrap();

        let loaded: Wrapper = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.broadcast.port, 6000);
        assert_eq!(loaded.broadcast.group, Ipv4Addr::new(224, 1, 1, 1));
        assert_eq!(loaded.broadcast.ttl, 1);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let result: Result<Wrapper> = load_config("/definitely/not/here.toml");
        assert!(result.is_err());
    }
}
