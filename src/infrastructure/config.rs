use crate::domain::config::{XenCredentials, XenToolsConfig};
use crate::domain::error::{XenError, XenResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_HOST: &str = "XENSERVER_HOST";
pub const ENV_USER: &str = "XENSERVER_USER";
pub const ENV_PASSWORD: &str = "XENSERVER_PASSWORD";
pub const ENV_CACHE_REFRESH: &str = "XENSERVER_CACHE_REFRESH";
pub const ENV_CACHE_PATH: &str = "XENSERVER_CACHE_PATH";
pub const ENV_CACHE_TTL: &str = "XENSERVER_CACHE_TTL";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
        }
    }

    /// Load configuration: the explicit file if given, else the global file
    /// if present, else defaults. Environment overrides are applied last.
    pub fn load(&self, explicit: Option<&Path>) -> XenResult<XenToolsConfig> {
        let mut config = self.load_file(explicit)?;
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// The explicit file if given, else the global file, without
    /// environment overrides.
    pub fn load_file(&self, explicit: Option<&Path>) -> XenResult<XenToolsConfig> {
        match explicit {
            Some(path) => self.load_config_from_path(path),
            None => self.load_config(),
        }
    }

    /// Load the global configuration file, falling back to defaults
    pub fn load_config(&self) -> XenResult<XenToolsConfig> {
        match &self.global_config_path {
            Some(path) if path.exists() => self.load_config_from_path(path),
            _ => Ok(XenToolsConfig::default()),
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> XenResult<XenToolsConfig> {
        let content = fs::read_to_string(path).map_err(|e| XenError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| XenError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Override cache settings from `XENSERVER_CACHE_*` variables
    pub fn apply_env<F>(config: &mut XenToolsConfig, lookup: F) -> XenResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CACHE_REFRESH) {
            config.cache.refresh = parse_flag(&value).unwrap_or_else(|| {
                warn!("Unrecognised {} value '{}', refreshing", ENV_CACHE_REFRESH, value);
                true
            });
        }

        if let Some(value) = lookup(ENV_CACHE_PATH).filter(|v| !v.is_empty()) {
            config.cache.path = PathBuf::from(value);
        }

        if let Some(value) = lookup(ENV_CACHE_TTL) {
            config.cache.ttl_secs = value.trim().parse().map_err(|_| XenError::Config {
                message: format!("{} must be a number of seconds, got '{}'", ENV_CACHE_TTL, value),
            })?;
        }

        Ok(())
    }

    /// Read the XAPI credentials from the process environment
    pub fn credentials_from_env() -> XenResult<XenCredentials> {
        Self::credentials(|key| std::env::var(key).ok())
    }

    /// Read the XAPI credentials; all three variables are required
    pub fn credentials<F>(lookup: F) -> XenResult<XenCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| XenError::Config {
                    message: format!("{} is not set", key),
                })
        };

        Ok(XenCredentials {
            host: require(ENV_HOST)?,
            username: require(ENV_USER)?,
            password: require(ENV_PASSWORD)?,
        })
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> Option<&PathBuf> {
        self.global_config_path.as_ref()
    }

    fn get_global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("xentools").join("config.toml"))
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret a boolean-ish environment value.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
