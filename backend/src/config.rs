//! # Application Configuration
//!
//! Settings are read from an optional YAML file and then overridden by
//! environment variables. Every field has a default, so an empty file (or no
//! file at all) yields a working local setup.
//!
//! ## YAML Format
//!
//! ```yaml
//! server:
//!   host: "127.0.0.1"
//!   port: 3000
//!   cors_origin: "http://localhost:8080"
//! database:
//!   url: "sqlite:kencleng.db"
//!   max_connections: 5
//! ledger:
//!   min_deposit: 1000
//!   max_deposit: 10000000
//!   min_target: 10000
//!   utc_offset_hours: 7
//! store:
//!   timeout_ms: 5000
//!   read_retries: 1
//! ```
//!
//! ## Environment Overrides
//!
//! - `KENCLENG_CONFIG`: path of the YAML file (default `kencleng.yaml` if it exists)
//! - `KENCLENG_HOST`, `KENCLENG_PORT`, `KENCLENG_DATABASE_URL`

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "kencleng.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ledger: LedgerPolicy,
    pub store: StorePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:kencleng.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Business limits applied when requests enter the ledger.
/// Amounts are in the smallest currency unit (Rupiah).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub min_target: i64,
    /// Offset of the community's local time, used for period and day boundaries
    pub utc_offset_hours: i32,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            min_deposit: 1_000,
            max_deposit: 10_000_000,
            min_target: 10_000,
            utc_offset_hours: 7,
        }
    }
}

impl LedgerPolicy {
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}

/// Time-box and retry budget for calls into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePolicy {
    pub timeout_ms: u64,
    /// Extra attempts granted to idempotent reads; writes never retry
    pub read_retries: u32,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            read_retries: 1,
        }
    }
}

impl StorePolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Load configuration from the file named by `KENCLENG_CONFIG` (or the
    /// default file when present), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("KENCLENG_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                default_path.exists().then_some(default_path)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&yaml_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("KENCLENG_HOST") {
            debug!("Overriding server host from environment");
            self.server.host = host;
        }
        if let Some(port) = lookup("KENCLENG_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("KENCLENG_PORT is not a valid port: {}", port))?;
        }
        if let Some(url) = lookup("KENCLENG_DATABASE_URL") {
            debug!("Overriding database url from environment");
            self.database.url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let ledger = &self.ledger;
        if ledger.min_deposit < 1 {
            return Err(anyhow!("ledger.min_deposit must be at least 1"));
        }
        if ledger.max_deposit < ledger.min_deposit {
            return Err(anyhow!(
                "ledger.max_deposit ({}) must not be below ledger.min_deposit ({})",
                ledger.max_deposit,
                ledger.min_deposit
            ));
        }
        if ledger.min_target < 1 {
            return Err(anyhow!("ledger.min_target must be at least 1"));
        }
        if !(-12..=14).contains(&ledger.utc_offset_hours) {
            return Err(anyhow!(
                "ledger.utc_offset_hours must be between -12 and 14, got {}",
                ledger.utc_offset_hours
            ));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.store.timeout_ms == 0 {
            return Err(anyhow!("store.timeout_ms must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ledger, LedgerPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = AppConfig::from_yaml("ledger:\n  min_deposit: 5000\n").unwrap();
        assert_eq!(config.ledger.min_deposit, 5000);
        assert_eq!(config.ledger.max_deposit, 10_000_000);
        assert_eq!(config.store.read_retries, 1);
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 8088\nstore:\n  timeout_ms: 250").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.store.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = AppConfig::from_yaml("server:\n  port: 8088\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("KENCLENG_PORT", "9000"),
            ("KENCLENG_DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "KENCLENG_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_deposit_limits() {
        let mut config = AppConfig::default();
        config.ledger.max_deposit = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ledger.utc_offset_hours = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utc_offset_uses_configured_hours() {
        let policy = LedgerPolicy::default();
        assert_eq!(policy.utc_offset().local_minus_utc(), 7 * 3600);
    }
}
