//! Configuration for the chainseal service.
//!
//! CLI arguments and environment variable handling using clap.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use chainseal::LedgerConfig;

/// Chainseal - tamper-evident audit trail service
#[derive(Parser, Debug, Clone)]
#[command(name = "chainseal-service")]
#[command(about = "HTTP intake and audit service for the chainseal ledger")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "0.0.0.0:8003")]
    pub bind: SocketAddr,

    /// Path of the sqlite index database
    /// Used when no remote index URL is configured
    #[arg(long, env = "DB_PATH", default_value = "chainseal.db")]
    pub db_path: PathBuf,

    /// Base URL of a remote HTTP index (e.g. "http://index:9200")
    /// When set, takes precedence over the sqlite index
    #[arg(long, env = "INDEX_URL")]
    pub index_url: Option<String>,

    /// Key prefix for entries in the remote index
    #[arg(long, env = "INDEX_PREFIX", default_value = "chainseal")]
    pub index_prefix: String,

    /// Basic auth username for the remote index (optional)
    #[arg(long, env = "INDEX_USERNAME")]
    pub index_username: Option<String>,

    /// Basic auth password for the remote index (optional)
    #[arg(long, env = "INDEX_PASSWORD")]
    pub index_password: Option<String>,

    /// Root directory of the retention archive
    /// Retention is disabled when unset
    #[arg(long, env = "ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Authoritative index write timeout in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "10000")]
    pub store_timeout_ms: u64,

    /// Retention archive write timeout in milliseconds
    #[arg(long, env = "RETENTION_TIMEOUT_MS", default_value = "5000")]
    pub retention_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Ledger timeouts derived from the millisecond flags.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            retention_timeout: Duration::from_millis(self.retention_timeout_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.index_username.is_some() != self.index_password.is_some() {
            return Err(
                "INDEX_USERNAME and INDEX_PASSWORD must be set together".to_string()
            );
        }

        if self.index_username.is_some() && self.index_url.is_none() {
            return Err("index credentials require INDEX_URL to be set".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.retention_timeout_ms == 0 {
            return Err("RETENTION_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
