use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::config::{load_config, BroadcastConfig};
use crate::common::messages::Role;
use crate::server::sessions::User;

/// Complete server configuration loaded from TOML file.
///
/// Every section is optional; missing values fall back to the defaults below.
///
/// # Example TOML
///
/// ```toml
/// [server]
/// control_address = "0.0.0.0:50007"
///
/// [broadcast]
/// group = "224.1.1.1"
/// port = 50008
/// ttl = 1
///
/// [voting]
/// duration_secs = 600
/// candidates = ["Candidato A", "Candidato B"]
///
/// [[users]]
/// username = "votante1"
/// secret = "123"
/// role = "voter"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerInfo,
    pub broadcast: BroadcastConfig,
    pub voting: VotingConfig,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    /// Address the control channel listens on
    pub control_address: String,
    /// Close connections idle for this long. Unset means no limit.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            control_address: "0.0.0.0:50007".to_string(),
            idle_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// How long the voting window stays open after startup
    pub duration_secs: u64,
    /// Candidates registered before the listener starts, in id order
    pub candidates: Vec<String>,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            candidates: vec!["Candidato A".to_string(), "Candidato B".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    pub fn voting_duration(&self) -> Duration {
        Duration::from_secs(self.voting.duration_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.server.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Configured users, or the built-in accounts when none are listed.
    pub fn accounts(&self) -> Vec<User> {
        if self.users.is_empty() {
            default_users()
        } else {
            self.users.clone()
        }
    }
}

fn default_users() -> Vec<User> {
    vec![
        User::new("votante1", "123", Role::Voter),
        User::new("votante2", "abc", Role::Voter),
        User::new("admin", "admin123", Role::Admin),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.control_address, "0.0.0.0:50007");
        assert_eq!(config.voting_duration(), Duration::from_secs(600));
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.accounts().len(), 3);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
control_address = "127.0.0.1:0"
idle_timeout_secs = 30

[voting]
duration_secs = 5

[[users]]
username = "chair"
secret = "s3cret"
role = "admin"
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.voting.duration_secs, 5);
        assert_eq!(config.voting.candidates.len(), 2);
        assert_eq!(config.accounts(), vec![User::new("chair", "s3cret", Role::Admin)]);
        assert_eq!(config.broadcast.port, 50008);
    }
}
