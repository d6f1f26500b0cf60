//! Cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum interval between persistent writes of the same cache.
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_secs(300);

/// Process-wide configuration for the cache subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory where cache files are stored.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Whether caches persist to disk by default.
    #[serde(default = "default_persistent")]
    pub persistent: bool,

    /// Minimum interval in seconds between writes of the same cache.
    #[serde(default = "default_write_interval")]
    pub write_interval_secs: u64,

    /// Project root used to namespace local caches.
    ///
    /// Local cache names fall back to the current directory when this is
    /// unset.
    #[serde(skip)]
    pub project_root: Option<PathBuf>,
}

fn default_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("wikinote"))
        .unwrap_or_else(|| PathBuf::from(".wikinote-cache"))
}

fn default_persistent() -> bool {
    true
}

fn default_write_interval() -> u64 {
    DEFAULT_WRITE_INTERVAL.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            persistent: default_persistent(),
            write_interval_secs: default_write_interval(),
            project_root: None,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration rooted at a specific directory (for testing
    /// and for hosts that manage their own cache location).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// The write throttle interval.
    pub fn write_interval(&self) -> Duration {
        Duration::from_secs(self.write_interval_secs)
    }

    /// The context path used to namespace local caches.
    pub fn context_path(&self) -> PathBuf {
        self.project_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
