//! Runtime configuration.
//!
//! Loaded from an explicit path, else `./court-rota.json`, else defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Project-local config file looked for when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "court-rota.json";

/// Environment variable overriding the web server port
pub const PORT_ENV_VAR: &str = "COURT_ROTA_PORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the pool and saved params are kept
    pub pool_path: PathBuf,

    /// Port for `court-rota web`
    pub port: u16,

    /// Pause between background retries
    pub poll_interval_ms: u64,

    /// Retries before the CLI gives up on converging
    pub max_iterations: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_path: PathBuf::from("pool.json"),
            port: 8080,
            poll_interval_ms: 10,
            max_iterations: 2000,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided (must exist)
    /// 2. court-rota.json in current directory
    /// 3. Defaults
    ///
    /// `COURT_ROTA_PORT` then overrides the port.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            let project_config = PathBuf::from(DEFAULT_CONFIG_FILE);
            if project_config.exists() {
                match Self::load_from_file(&project_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", DEFAULT_CONFIG_FILE);
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", DEFAULT_CONFIG_FILE, e);
                        Self::default()
                    }
                }
            } else {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(port) = std::env::var(PORT_ENV_VAR) {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring {}={:?}: not a port number", PORT_ENV_VAR, port),
            }
        }
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pool_path, PathBuf::from("pool.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"poll_interval_ms": 25, "pool_path": "/tmp/club.json"}"#)?;
        let config = Config::load_from_file(&path)?;
        assert_eq!(config.poll_interval_ms, 25);
        assert_eq!(config.pool_path, PathBuf::from("/tmp/club.json"));
        assert_eq!(config.max_iterations, 2000);
        Ok(())
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let path = PathBuf::from("/no/such/court-rota.json");
        assert!(Config::load(Some(&path)).is_err());
    }
}
