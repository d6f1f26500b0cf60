//! Process-wide cache registry.
//!
//! At most one live [`Cache`] exists per logical name; every `open` of the
//! same name hands out a handle to the same instance, so all callers
//! observe the same mutations. The registry flushes every open cache when
//! dropped, so writes still pending inside the throttle window survive a
//! normal shutdown even if the host forgets an explicit checkpoint.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Cache, CacheConfig, CacheError, CacheOptions, local_name};

/// Shared handle to a registered cache.
#[derive(Debug, Clone)]
pub struct CacheHandle(Arc<Mutex<Cache>>);

impl CacheHandle {
    fn new(cache: Cache) -> Self {
        Self(Arc::new(Mutex::new(cache)))
    }

    /// Locks the underlying cache for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Cache> {
        self.0.lock()
    }

    /// See [`Cache::get`].
    pub fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.0.lock().get(key)
    }

    /// See [`Cache::has`].
    pub fn has(&self, key: &str) -> Result<bool, CacheError> {
        self.0.lock().has(key)
    }

    /// See [`Cache::set`].
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<Value, CacheError> {
        self.0.lock().set(key, value)
    }

    /// See [`Cache::clear`].
    pub fn clear(&self) -> Result<(), CacheError> {
        self.0.lock().clear()
    }
}

/// Registry mapping cache names to at most one live instance each.
pub struct CacheRegistry {
    config: CacheConfig,
    caches: HashMap<String, CacheHandle>,
}

impl CacheRegistry {
    /// Creates a registry over the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            caches: HashMap::new(),
        }
    }

    /// The registry configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Opens the cache `name`, constructing it on first use.
    ///
    /// Repeated opens of the same resolved name return handles to the same
    /// instance; construction options of later calls are ignored.
    pub fn open(&mut self, name: &str, opts: CacheOptions) -> Result<CacheHandle, CacheError> {
        let resolved = self.resolve_name(name, opts.local);
        if let Some(handle) = self.caches.get(&resolved) {
            return Ok(handle.clone());
        }

        debug!("Opening cache {resolved}");
        let handle = CacheHandle::new(Cache::open(resolved.clone(), opts, &self.config)?);
        self.caches.insert(resolved, handle.clone());
        Ok(handle)
    }

    /// Flushes and unregisters `name`, trying the global form first and the
    /// local-namespaced form second.
    ///
    /// Unknown names are a no-op. After a close the name is eligible for a
    /// fresh `open`.
    pub fn close(&mut self, name: &str) -> Result<(), CacheError> {
        for candidate in [name.to_string(), self.resolve_name(name, true)] {
            if let Some(handle) = self.caches.remove(&candidate) {
                handle.lock().flush()?;
                debug!("Closed cache {candidate}");
                return Ok(());
            }
        }
        Ok(())
    }

    /// Clears `name` in both its global and local-namespaced forms.
    ///
    /// An open instance is cleared in place. When persistence is enabled, a
    /// name with no open instance is opened first, so the backing file is
    /// deleted even when nothing currently holds it in memory. An empty
    /// name clears nothing.
    pub fn clear(&mut self, name: &str) -> Result<(), CacheError> {
        if name.is_empty() {
            return Ok(());
        }

        for candidate in [name.to_string(), self.resolve_name(name, true)] {
            if let Some(handle) = self.caches.get(&candidate).cloned() {
                handle.clear()?;
            } else if self.config.persistent {
                self.open(&candidate, CacheOptions::default())?.clear()?;
            }
        }
        Ok(())
    }

    /// Clears every cache file under the cache root.
    pub fn clear_all(&mut self) -> Result<(), CacheError> {
        for name in cache_file_names(&self.config.root)? {
            self.open(&name, CacheOptions::default())?.clear()?;
        }
        Ok(())
    }

    /// Flushes every open cache, bypassing the write throttle.
    ///
    /// The explicit checkpoint the host should invoke at shutdown.
    pub fn write_all(&self) -> Result<(), CacheError> {
        for handle in self.caches.values() {
            handle.lock().flush()?;
        }
        Ok(())
    }

    fn resolve_name(&self, name: &str, local: bool) -> String {
        if local {
            local_name(name, &self.config.context_path())
        } else {
            name.to_string()
        }
    }
}

impl Drop for CacheRegistry {
    /// Best-effort flush of pending writes; failures are logged, not raised.
    fn drop(&mut self) {
        for (name, handle) in &self.caches {
            if let Err(err) = handle.lock().flush() {
                warn!("Failed to flush cache {name} on shutdown: {err}");
            }
        }
    }
}

/// Enumerates the cache names backing `*.json` files under `root`.
fn cache_file_names(root: &Path) -> Result<Vec<String>, CacheError> {
    let mut names = Vec::new();
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(names),
        Err(err) => return Err(err.into()),
    };

    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json")
            && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
        {
            names.push(stem.to_string());
        }
    }
    Ok(names)
}
