use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::config::{load_config, BroadcastConfig};

/// Client configuration loaded from TOML file.
///
/// # Example TOML
///
/// ```toml
/// [client]
/// server_address = "127.0.0.1:50007"
///
/// [broadcast]
/// group = "224.1.1.1"
/// port = 50008
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub client: ClientInfo,
    pub broadcast: BroadcastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    /// Control channel address of the poll server
    pub server_address: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:50007".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }
}
