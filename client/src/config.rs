//! Configuration management for the client.

use std::env;
use std::path::PathBuf;

const DEFAULT_LOG_FILTER: &str = "psorcast_client=info";
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for the file-backed local store; in-memory when unset
    pub local_store_dir: Option<PathBuf>,
    /// Reload every report from the remote store at start
    pub sync_on_start: bool,
    /// `tracing` filter directive
    pub log_filter: String,
    /// Buffered change events per subscriber
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_store_dir: None,
            sync_on_start: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let local_store_dir = lookup("PSORCAST_LOCAL_STORE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let sync_on_start = match lookup("PSORCAST_SYNC_ON_START") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidSyncOnStart(value))?,
            None => true,
        };

        let log_filter = lookup("PSORCAST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let event_capacity = match lookup("PSORCAST_EVENT_CAPACITY") {
            Some(value) => value
                .parse()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidEventCapacity(value))?,
            None => DEFAULT_EVENT_CAPACITY,
        };

        Ok(Self {
            local_store_dir,
            sync_on_start,
            log_filter,
            event_capacity,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PSORCAST_SYNC_ON_START value: {0}")]
    InvalidSyncOnStart(String),

    #[error("Invalid PSORCAST_EVENT_CAPACITY value: {0}")]
    InvalidEventCapacity(String),
}
