//! Command-line interface definition.

use clap::Parser;
use peekly_service::ServiceConfig;
use std::path::PathBuf;

/// Pay-to-unlock content marketplace service.
#[derive(Parser, Debug)]
#[command(name = "peekly-service")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory for service data.
    #[arg(long, env = "PEEKLY_ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Address of the payment settlement contract.
    #[arg(long, env = "PEEKLY_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Disable on-chain verification; only local entitlement records
    /// unlock content.
    #[arg(long)]
    pub no_settlement: bool,

    /// Timeout for on-chain reads, in seconds.
    #[arg(long, env = "PEEKLY_QUERY_TIMEOUT")]
    pub query_timeout: Option<u64>,

    /// Capacity of the in-process entitlement cache.
    #[arg(long, env = "PEEKLY_CACHE_CAPACITY")]
    pub cache_capacity: Option<usize>,

    /// Log level.
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Path to configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Convert CLI arguments into a ServiceConfig.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is specified but cannot be loaded.
    pub fn into_config(self) -> color_eyre::Result<ServiceConfig> {
        // Start with default config or load from file
        let mut config = if let Some(ref path) = self.config {
            ServiceConfig::from_file(path)?
        } else {
            ServiceConfig::default()
        };

        // Override with CLI arguments
        if let Some(root_dir) = self.root_dir {
            config.root_dir = root_dir;
        }
        if let Some(address) = self.contract_address {
            config.settlement.contract_address = address;
        }
        if let Some(secs) = self.query_timeout {
            config.settlement.query_timeout_secs = secs;
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = capacity;
        }
        if self.no_settlement {
            config.settlement.enabled = false;
        }
        config.log_level = self.log_level;

        Ok(config)
    }
}
