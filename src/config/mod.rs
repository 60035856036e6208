//! # Configuration Management Module
//!
//! Configuration for the board server, loaded from TOML with serde.
//!
//! ## Configuration Structure
//!
//! - [`BbsConfig`] - Board name, greeting, idle timeout and disconnect policy
//! - [`NetworkConfig`] - Listen address and line limits
//! - [`GroupConfig`] - One entry per private group board (fixed at startup)
//! - [`LoggingConfig`] - Log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use boardd::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Listening on {}", config.listen_addr());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bbs]
//! name = "Bulletin Board"
//! session_timeout = 0
//!
//! [network]
//! host = "127.0.0.1"
//! port = 5000
//!
//! [logging]
//! level = "info"
//!
//! [[groups]]
//! id = "1"
//! name = "Group Alpha"
//! ```
//!
//! Precedence: CLI args > config file > defaults.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BbsConfig {
    pub name: String,
    /// Sent as the first line of every connection when non-empty.
    #[serde(default)]
    pub welcome_message: String,
    /// Idle minutes before a connection is closed; 0 disables the timeout.
    #[serde(default)]
    pub session_timeout: u32,
    /// Remove a session's username from the boards it joined when it disconnects.
    #[serde(default = "default_release_on_disconnect")]
    pub release_on_disconnect: bool,
}

fn default_release_on_disconnect() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    /// Longest accepted command line in bytes, excluding the terminator.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

fn default_max_line_length() -> usize {
    4096
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bbs: BbsConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.network.max_line_length == 0 {
            bail!("network.max_line_length must be greater than zero");
        }
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for group in &self.groups {
            if group.id.trim().is_empty() || group.name.trim().is_empty() {
                bail!("group entries need a non-empty id and name (got id='{}', name='{}')", group.id, group.name);
            }
            if !ids.insert(group.id.as_str()) {
                bail!("duplicate group id '{}'", group.id);
            }
            if !names.insert(group.name.as_str()) {
                bail!("duplicate group name '{}'", group.name);
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.network.host, self.network.port)
    }

    /// `(id, name)` pairs in configuration order.
    pub fn group_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.groups.iter().map(|g| (g.id.clone(), g.name.clone()))
    }
}

impl Default for Config {
    fn default() -> Self {
        let groups = ["Alpha", "Beta", "Gamma", "Delta", "Epsilon"]
            .iter()
            .enumerate()
            .map(|(i, name)| GroupConfig {
                id: (i + 1).to_string(),
                name: format!("Group {}", name),
            })
            .collect();

        Config {
            bbs: BbsConfig {
                name: "Bulletin Board".to_string(),
                welcome_message: "".to_string(),
                session_timeout: 0,
                release_on_disconnect: true,
            },
            network: NetworkConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_line_length: default_max_line_length(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
            groups,
        }
    }
}
