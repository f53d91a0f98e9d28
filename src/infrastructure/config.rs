use crate::domain::error::QwarmError;
use crate::domain::model::DriverId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub drivers: DriverSettings,
    #[serde(default)]
    pub logging: Logging,
}

/// Cache keys and the operation -> key apply map.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheSettings {
    /// Cache key -> refresh interval. One entry is created per key at
    /// startup.
    #[serde(default)]
    pub data: HashMap<String, CacheItem>,
    /// Operation name -> cache key. Operations absent from this map are
    /// never cached.
    #[serde(default)]
    pub apply_map: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheItem {
    pub interval_seconds: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default = "default_sweep_seconds")]
    pub sweep_seconds: u64,
    /// Grace period before the first sweep, so connection pools can
    /// finish initializing.
    #[serde(default = "default_initial_delay_seconds")]
    pub initial_delay_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DriverSettings {
    /// Which driver families get a pool. Credentials present below for a
    /// family not listed here are ignored.
    #[serde(rename = "use", default)]
    pub enabled: Vec<DriverId>,
    pub sqlite: Option<SqliteSettings>,
    pub http: Option<HttpSettings>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SqliteSettings {
    /// Database file path; ":memory:" opens an in-memory database.
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpSettings {
    pub endpoint: String,
    #[serde(default = "default_http_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enable: true,
            sweep_seconds: default_sweep_seconds(),
            initial_delay_seconds: default_initial_delay_seconds(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            scheduler: SchedulerSettings::default(),
            drivers: DriverSettings::default(),
            logging: Logging::default(),
        }
    }
}

// Defaults
fn default_enable() -> bool {
    true
}
fn default_sweep_seconds() -> u64 {
    60
}
fn default_initial_delay_seconds() -> u64 {
    5
}
fn default_http_timeout_seconds() -> u64 {
    180
}
fn default_log_level() -> String {
    "WARN".to_string()
}

/// Load configuration from a TOML file.
///
/// A missing file yields defaults; a malformed one warns and falls back
/// to defaults rather than refusing to start.
pub fn load_config(path: &Path) -> Result<Config, QwarmError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        match toml::from_str::<Config>(&content) {
            Ok(config) => return Ok(config),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse config file: {}. Using defaults.",
                    e
                );
            }
        }
    }

    Ok(Config::default())
}

/// Parse configuration from a TOML string, without the file fallback.
pub fn parse_config(content: &str) -> Result<Config, QwarmError> {
    Ok(toml::from_str::<Config>(content)?)
}
