use crate::domain::config::CacheConfig;
use crate::domain::error::{XenError, XenResult};
use crate::domain::inventory::InventoryDocument;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Mode of the cache file, readable by other users of a shared directory.
#[cfg(unix)]
const CACHE_FILE_MODE: u32 = 0o644;

/// Anything that can produce a fresh inventory.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn build_inventory(&self) -> XenResult<InventoryDocument>;
}

/// Single-file inventory cache with a time to live.
///
/// Freshness is the file's modification time; there is no per-host keying.
#[derive(Debug, Clone)]
pub struct InventoryCache {
    path: PathBuf,
    ttl: Duration,
}

impl InventoryCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.path.clone(), config.ttl())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached inventory while fresh, otherwise rebuilt and stored.
    ///
    /// `refresh` forces a rebuild. A cache file that cannot be read or
    /// parsed is replaced.
    pub async fn cached_inventory<S>(&self, source: &S, refresh: bool) -> XenResult<InventoryDocument>
    where
        S: InventorySource + ?Sized,
    {
        if refresh {
            debug!("Cache refresh requested");
            return self.rebuild(source).await;
        }

        if self.is_fresh() {
            match self.load() {
                Ok(inventory) => {
                    info!("Using cached inventory from {}", self.path.display());
                    return Ok(inventory);
                }
                Err(e) => warn!("Discarding unreadable cache: {}", e),
            }
        }

        self.rebuild(source).await
    }

    /// Host variables for `host`.
    ///
    /// Currently folds the hostvars of every VM into one map, later VMs
    /// winning on key collisions; `host` does not narrow the result.
    pub async fn cached_host<S>(&self, host: &str, source: &S, refresh: bool) -> XenResult<Map<String, Value>>
    where
        S: InventorySource + ?Sized,
    {
        let inventory = self.cached_inventory(source, refresh).await?;
        debug!(
            "Host vars requested for '{}', merging {} hosts",
            host,
            inventory.meta.hostvars.len()
        );
        Ok(inventory.merged_host_vars())
    }

    /// Age of the cache file, or `None` when there is no file. A
    /// modification time in the future counts as age zero.
    pub fn age(&self) -> Option<Duration> {
        let metadata = fs::metadata(&self.path).ok().filter(|m| m.is_file())?;
        let modified = metadata.modified().ok()?;
        Some(SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO))
    }

    pub fn is_fresh(&self) -> bool {
        self.age().is_some_and(|age| age < self.ttl)
    }

    pub fn load(&self) -> XenResult<InventoryDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| XenError::Cache {
            message: format!("Failed to read {}: {}", self.path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| XenError::Cache {
            message: format!("Failed to parse {}: {}", self.path.display(), e),
        })
    }

    /// Write the inventory through a temporary file renamed over the cache,
    /// so readers see either the old or the new document.
    pub fn save(&self, inventory: &InventoryDocument) -> XenResult<()> {
        self.ensure_directory()?;
        let dir = self.directory().unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir).map_err(|e| XenError::Cache {
            message: format!("Failed to create temporary file in {}: {}", dir.display(), e),
        })?;

        serde_json::to_writer(&mut file, inventory).map_err(|e| XenError::Cache {
            message: format!("Failed to serialize inventory: {}", e),
        })?;
        file.flush().map_err(|e| XenError::Cache {
            message: format!("Failed to write inventory: {}", e),
        })?;
        share_file(file.as_file()).map_err(|e| XenError::Cache {
            message: format!("Failed to set permissions on {}: {}", file.path().display(), e),
        })?;

        file.persist(&self.path).map_err(|e| XenError::Cache {
            message: format!("Failed to replace {}: {}", self.path.display(), e.error),
        })?;

        debug!("Inventory cached at {}", self.path.display());
        Ok(())
    }

    async fn rebuild<S>(&self, source: &S) -> XenResult<InventoryDocument>
    where
        S: InventorySource + ?Sized,
    {
        self.ensure_directory()?;
        let inventory = source.build_inventory().await?;
        self.save(&inventory)?;
        Ok(inventory)
    }

    fn directory(&self) -> Option<&Path> {
        self.path.parent().filter(|dir| !dir.as_os_str().is_empty())
    }

    fn ensure_directory(&self) -> XenResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(XenError::Cache {
                message: "cache path not defined".to_string(),
            });
        }

        let Some(dir) = self.directory() else {
            return Ok(());
        };
        if dir.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(dir).or_else(|e| directory_error(dir, e))
    }
}

/// Classify a failed cache directory creation. Permission problems are
/// fatal, a concurrent creation is not.
fn directory_error(dir: &Path, error: io::Error) -> XenResult<()> {
    match error.kind() {
        ErrorKind::AlreadyExists => Ok(()),
        ErrorKind::PermissionDenied => Err(XenError::CacheDirectory {
            path: dir.to_path_buf(),
            source: error,
        }),
        _ => Err(XenError::Cache {
            message: format!("Failed to create {}: {}", dir.display(), error),
        }),
    }
}

#[cfg(unix)]
fn share_file(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(CACHE_FILE_MODE))
}

#[cfg(not(unix))]
fn share_file(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
