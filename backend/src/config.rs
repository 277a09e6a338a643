//! # Configuration
//!
//! Server settings, read once at startup.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. YAML file named by `FINANCE_TRACKER_CONFIG`, if set
//! 3. Environment: `FINANCE_TRACKER_DATA_DIR`, `FINANCE_TRACKER_BIND`,
//!    `FINANCE_TRACKER_CORS_ORIGIN`, `FINANCE_TRACKER_LOG`
//!
//! ## YAML Format
//!
//! ```yaml
//! data_directory: "/home/me/Documents/Finance Tracker"
//! bind_address: "127.0.0.1:3000"
//! cors_origin: "http://localhost:8080"
//! log_filter: "info"
//! ledger_timeout_secs: 5
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::storage::CsvConnection;

pub const CONFIG_PATH_VAR: &str = "FINANCE_TRACKER_CONFIG";
pub const DATA_DIR_VAR: &str = "FINANCE_TRACKER_DATA_DIR";
pub const BIND_VAR: &str = "FINANCE_TRACKER_BIND";
pub const CORS_ORIGIN_VAR: &str = "FINANCE_TRACKER_CORS_ORIGIN";
pub const LOG_VAR: &str = "FINANCE_TRACKER_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where per-user data lives; `~/Documents/Finance Tracker` when unset
    pub data_directory: Option<PathBuf>,
    pub bind_address: String,
    pub cors_origin: String,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// How long a ledger request waits for the first snapshot
    pub ledger_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            log_filter: "info".to_string(),
            ledger_timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load from the optional config file, then the process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = lookup(DATA_DIR_VAR) {
            self.data_directory = Some(PathBuf::from(dir));
        }
        if let Some(bind) = lookup(BIND_VAR) {
            self.bind_address = bind;
        }
        if let Some(origin) = lookup(CORS_ORIGIN_VAR) {
            self.cors_origin = origin;
        }
        if let Some(filter) = lookup(LOG_VAR) {
            self.log_filter = filter;
        }
    }

    pub fn data_directory(&self) -> Result<PathBuf> {
        match &self.data_directory {
            Some(dir) => Ok(dir.clone()),
            None => CsvConnection::default_data_directory(),
        }
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout_secs)
    }
}
