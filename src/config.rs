//! Configuration for peekly-service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root directory for service data. The database lives at
    /// `<root_dir>/peekly.db`.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Settlement contract configuration.
    #[serde(default)]
    pub settlement: SettlementConfig,

    /// Capacity of the in-process entitlement cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Settlement contract configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Address of the payment settlement contract.
    #[serde(default)]
    pub contract_address: String,

    /// Timeout for on-chain reads, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Whether on-chain verification is enabled. When disabled, only
    /// local entitlement records unlock content.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SettlementConfig {
    /// Timeout for on-chain reads.
    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            settlement: SettlementConfig::default(),
            cache_capacity: default_cache_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            query_timeout_secs: default_query_timeout_secs(),
            enabled: true,
        }
    }
}

fn default_root_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "peekly")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".peekly"))
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_cache_capacity() -> usize {
    100_000
}

const fn default_query_timeout_secs() -> u64 {
    30
}

const fn default_true() -> bool {
    true
}

impl ServiceConfig {
    /// Path to the SQLite database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.root_dir.join("peekly.db")
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
