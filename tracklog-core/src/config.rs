//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tracklog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/tracklog/` (~/.config/tracklog/)
//! - Data: `$XDG_DATA_HOME/tracklog/` (~/.local/share/tracklog/)
//! - State/Logs: `$XDG_STATE_HOME/tracklog/` (~/.local/state/tracklog/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Buffer length above which a flush is attempted.
pub const DEFAULT_FLUSH_LIMIT: usize = 20;

/// Hard cap on buffer length.
pub const DEFAULT_FOOLPROOF: usize = 100;

/// File name of the pending-events snapshot.
pub const DEFAULT_SNAPSHOT_FILE: &str = "events.log";

/// Network submission timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const APP_DIR: &str = "tracklog";

/// Returns a best-effort home directory path.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".config")))
}

/// Returns XDG_DATA_HOME or the platform data directory
fn xdg_data_home() -> Option<PathBuf> {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> Option<PathBuf> {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".local/state")))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Event collector configuration
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Event collector configuration
///
/// Read once when the collector is constructed; changing it afterwards has
/// no effect on a running collector.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    /// Collection endpoint (e.g., `https://stats.example.com/events`)
    pub endpoint: Option<String>,

    /// Buffer length above which a flush is attempted
    #[serde(default = "default_flush_limit")]
    pub flush_limit: usize,

    /// Hard cap on buffer length; older events are dropped past it
    #[serde(default = "default_foolproof")]
    pub foolproof: usize,

    /// Snapshot file name inside the data directory
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Override for the per-user data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            flush_limit: default_flush_limit(),
            foolproof: default_foolproof(),
            snapshot_file: default_snapshot_file(),
            timeout_secs: default_timeout(),
            data_dir: None,
        }
    }
}

fn default_flush_limit() -> usize {
    DEFAULT_FLUSH_LIMIT
}

fn default_foolproof() -> usize {
    DEFAULT_FOOLPROOF
}

fn default_snapshot_file() -> String {
    DEFAULT_SNAPSHOT_FILE.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl CollectorConfig {
    /// Validate buffer bounds and file settings
    pub fn validate(&self) -> Result<()> {
        if self.foolproof == 0 {
            return Err(Error::Config(
                "collector.foolproof must be at least 1".to_string(),
            ));
        }
        if self.flush_limit >= self.foolproof {
            return Err(Error::Config(format!(
                "collector.flush_limit ({}) must be less than collector.foolproof ({})",
                self.flush_limit, self.foolproof
            )));
        }
        let name = Path::new(&self.snapshot_file);
        if self.snapshot_file.is_empty() || name.file_name() != Some(name.as_os_str()) {
            return Err(Error::Config(format!(
                "collector.snapshot_file must be a bare file name, got {:?}",
                self.snapshot_file
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "collector.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and return the endpoint URL required by the HTTP transport
    pub fn validate_endpoint(&self) -> Result<reqwest::Url> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("collector.endpoint is required".to_string()))?;

        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid collector.endpoint: {}", e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "collector.endpoint must use http or https, got {}",
                other
            ))),
        }
    }

    /// Directory holding the snapshot file, if one can be resolved
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(Config::data_dir)
    }

    /// Full path of the snapshot file, if the data directory resolves
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.resolve_data_dir().map(|dir| dir.join(&self.snapshot_file))
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let Some(config_path) = Self::config_path() else {
            tracing::info!("No config directory resolvable, using defaults");
            return Ok(Config::default());
        };

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.collector.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/tracklog/config.toml` (~/.config/tracklog/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        xdg_config_home().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Returns the data directory path (for the snapshot and identity files)
    ///
    /// `$XDG_DATA_HOME/tracklog/` (~/.local/share/tracklog/)
    pub fn data_dir() -> Option<PathBuf> {
        xdg_data_home().map(|dir| dir.join(APP_DIR))
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/tracklog/` (~/.local/state/tracklog/)
    pub fn state_dir() -> Option<PathBuf> {
        xdg_state_home().map(|dir| dir.join(APP_DIR))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/tracklog/tracklog.log` (~/.local/state/tracklog/tracklog.log)
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("tracklog.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_config_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.flush_limit, 20);
        assert_eq!(config.foolproof, 100);
        assert_eq!(config.snapshot_file, "events.log");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.endpoint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[collector]
endpoint = "https://stats.example.com/events"
flush_limit = 10
data_dir = "/tmp/tracklog-test"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.collector.endpoint.as_deref(),
            Some("https://stats.example.com/events")
        );
        assert_eq!(config.collector.flush_limit, 10);
        assert_eq!(config.collector.foolproof, 100);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.collector.snapshot_path(),
            Some(PathBuf::from("/tmp/tracklog-test/events.log"))
        );
    }

    #[test]
    fn test_collector_config_validation() {
        let config = CollectorConfig {
            flush_limit: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            foolproof: 0,
            flush_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            snapshot_file: "nested/events.log".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            snapshot_file: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            flush_limit: 3,
            foolproof: 5,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_endpoint() {
        let mut config = CollectorConfig::default();
        assert!(config.validate_endpoint().is_err());

        config.endpoint = Some("not a url".to_string());
        assert!(config.validate_endpoint().is_err());

        config.endpoint = Some("ftp://stats.example.com".to_string());
        assert!(config.validate_endpoint().is_err());

        config.endpoint = Some("https://stats.example.com/events".to_string());
        let url = config.validate_endpoint().unwrap();
        assert_eq!(url.path(), "/events");
    }

    #[test]
    fn test_load_from_rejects_invalid_bounds() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[collector]\nflush_limit = 50\nfoolproof = 50\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = CollectorConfig {
            data_dir: Some(PathBuf::from("/var/lib/app")),
            snapshot_file: "pending.json".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.snapshot_path(),
            Some(PathBuf::from("/var/lib/app/pending.json"))
        );
    }
}
