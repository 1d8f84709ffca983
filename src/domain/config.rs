use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// xentools configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XenToolsConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Inventory cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Inventory builder settings
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Inventory cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache file location
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Time to live in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Always rebuild the cache
    #[serde(default)]
    pub refresh: bool,
}

/// Inventory builder settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Run one grouping pass per network interface instead of per VM
    #[serde(default)]
    pub per_interface_passes: bool,
}

impl GlobalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// XAPI endpoint and login, read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct XenCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for XenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XenCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_timeout() -> u64 {
    30_000
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("/tmp/xenserver_inv.cache")
}

fn default_cache_ttl() -> u64 {
    10
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            ttl_secs: default_cache_ttl(),
            refresh: false,
        }
    }
}
