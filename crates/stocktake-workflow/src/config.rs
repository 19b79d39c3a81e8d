//! # Audit Configuration
//!
//! Configuration for the audit service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKTAKE_DATABASE_PATH=/data/stocktake.db                         │
//! │     STOCKTAKE_MAX_CONNECTIONS=8                                        │
//! │     STOCKTAKE_LOG_FILTER=info,stocktake=debug                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stocktake/stocktake.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stocktake.audit/... (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/stocktake/stocktake.db"
//! max_connections = 5
//! acquire_timeout_secs = 30
//! busy_timeout_ms = 5000
//!
//! [workflow]
//! closing_note_header = true
//!
//! [logging]
//! filter = "info,stocktake=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use stocktake_db::DbConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

/// Where and how to open the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Pool acquire timeout (seconds).
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// How long a write waits on SQLite's lock (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "stocktake", "audit")
        .map(|dirs| dirs.data_dir().join("stocktake.db"))
        .unwrap_or_else(|| PathBuf::from("./stocktake.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Workflow Settings
// =============================================================================

/// Behaviour switches for the workflow operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Prefix the closing note with `[closed <timestamp>]`.
    #[serde(default = "default_true")]
    pub closing_note_header: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        WorkflowSettings {
            closing_note_header: true,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,stocktake=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete audit service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AuditConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stocktake.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading audit config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections fall back to defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Builds the pool configuration for [`stocktake_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .acquire_timeout(Duration::from_secs(self.database.acquire_timeout_secs))
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STOCKTAKE_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("STOCKTAKE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid STOCKTAKE_MAX_CONNECTIONS"),
            }
        }

        if let Ok(filter) = std::env::var("STOCKTAKE_LOG_FILTER") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stocktake", "audit")
            .map(|dirs| dirs.config_dir().join("stocktake.toml"))
    }
}
