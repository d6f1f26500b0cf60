//! Per-name cache state machine.
//!
//! Each cache owns an in-memory JSON object and, when persistent, a backing
//! file at `<root>/<name>.json` that may be shared with other editor
//! processes. Coordination with those processes is advisory: reads compare
//! the file's mtime against the last one seen, and writes are throttled and
//! re-read the file before rewriting it in full.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{CacheConfig, CacheError};

/// Reserved key holding the validation stamp inside the backing file.
pub const VALIDATION_KEY: &str = "__validate";

/// Format version carried by validation stamps. Bumping it wipes every
/// previously persisted cache on next open.
const FORMAT_VERSION: &str = "wikinote.cache.v1";

/// Construction options for a single cache.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Namespace the cache name by the configured context path.
    pub local: bool,

    /// Override the process-wide persistence default.
    pub persistent: Option<bool>,

    /// Value materialized into the cache on a `get` miss.
    pub default: Option<Value>,

    /// Validation stamp. A mismatch against the stamp stored on disk wipes
    /// the backing file on open.
    pub validate: Option<Value>,
}

/// A named key-value store with optional file persistence.
#[derive(Debug)]
pub struct Cache {
    name: String,
    path: PathBuf,
    persistent: bool,
    local: bool,
    default: Option<Value>,
    data: Map<String, Value>,
    /// Backing file mtime as of the last successful read. `None` means the
    /// file has never been read.
    last_seen_mtime: Option<SystemTime>,
    /// Time of the last persisted write, driving the throttle window.
    last_write: Option<SystemTime>,
    dirty: bool,
    write_interval: Duration,
}

impl Cache {
    /// Opens a cache, creating the cache root and validating any existing
    /// backing file.
    ///
    /// A persistent cache whose stored validation stamp does not match the
    /// expected one is wiped and rewritten with the new stamp, so format
    /// bumps heal themselves instead of surfacing as decode errors in the
    /// caller.
    pub(crate) fn open(
        name: impl Into<String>,
        opts: CacheOptions,
        config: &CacheConfig,
    ) -> Result<Self, CacheError> {
        let name = name.into();
        fs::create_dir_all(&config.root)?;

        let mut cache = Self {
            path: config.root.join(format!("{name}.json")),
            name,
            persistent: opts.persistent.unwrap_or(config.persistent),
            local: opts.local,
            default: opts.default,
            data: Map::new(),
            last_seen_mtime: None,
            last_write: None,
            dirty: false,
            write_interval: config.write_interval(),
        };

        if cache.persistent {
            let stamp = validation_stamp(opts.validate);
            cache.read()?;
            if cache.data.get(VALIDATION_KEY) != Some(&stamp) {
                info!("Cache {} is out of date, resetting", cache.name);
                cache.clear()?;
                cache.data.insert(VALIDATION_KEY.to_string(), stamp);
                cache.dirty = true;
                cache.flush()?;
            }
        }

        Ok(cache)
    }

    /// The cache name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing file. Not meaningful when the cache is not
    /// persistent.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the cache persists to disk.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Whether the cache name was namespaced by its context.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// Whether in-memory mutations have not yet been persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Gets the value stored under `key`, refreshing from the backing file
    /// first.
    ///
    /// A configured default is materialized as a fresh copy on a miss, so
    /// it is never aliased across keys. Without a default, a miss returns
    /// `None`.
    pub fn get(&mut self, key: &str) -> Result<Option<Value>, CacheError> {
        self.read()?;
        if !self.data.contains_key(key)
            && let Some(default) = &self.default
        {
            self.data.insert(key.to_string(), default.clone());
        }
        Ok(self.data.get(key).cloned())
    }

    /// Checks whether `key` is present, refreshing from the backing file
    /// first.
    pub fn has(&mut self, key: &str) -> Result<bool, CacheError> {
        self.read()?;
        Ok(self.data.contains_key(key))
    }

    /// Stores `value` under `key` and attempts a throttled write-back.
    ///
    /// Returns the stored value so call sites can assign and return in one
    /// expression.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<Value, CacheError> {
        self.read()?;
        self.data.insert(key.into(), value.clone());
        self.dirty = true;
        self.write()?;
        Ok(value)
    }

    /// Keys currently present in memory, excluding the validation stamp.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data
            .keys()
            .map(String::as_str)
            .filter(|key| *key != VALIDATION_KEY)
    }

    /// Number of stored entries, excluding the validation stamp.
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resets the cache to its initial state and deletes the backing file.
    ///
    /// Deleting a file that does not exist is not an error, so clearing is
    /// idempotent.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.data.clear();
        self.last_seen_mtime = None;
        self.last_write = None;
        self.dirty = false;

        if self.persistent
            && let Err(err) = fs::remove_file(&self.path)
            && err.kind() != ErrorKind::NotFound
        {
            return Err(err.into());
        }

        debug!("Cleared cache {}", self.name);
        Ok(())
    }

    /// Merges the backing file into memory when it has changed on disk.
    ///
    /// Keys already present in memory win over file content, so uncommitted
    /// local mutations survive a reload. When the file's mtime is not newer
    /// than the last one seen, the file is not parsed at all.
    pub fn read(&mut self) -> Result<(), CacheError> {
        if !self.persistent {
            return Ok(());
        }

        let mtime = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.modified()?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No cache file found at {}", self.path.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if self.last_seen_mtime.is_some_and(|seen| mtime <= seen) {
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)?;
        let stored: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| CacheError::corrupted(e.to_string()))?;

        debug!(
            "Merging {} entries from {}",
            stored.len(),
            self.path.display()
        );
        for (key, value) in stored {
            self.data.entry(key).or_insert(value);
        }
        self.last_seen_mtime = Some(mtime);

        Ok(())
    }

    /// Throttled write-back.
    ///
    /// Persists dirty data unless a write already happened within the write
    /// interval. A skipped write is deferred, not lost: the cache stays
    /// dirty and memory remains authoritative until the next opportunity.
    pub fn write(&mut self) -> Result<(), CacheError> {
        if !self.persistent || !self.dirty {
            return Ok(());
        }

        if let Some(last) = self.last_write
            && SystemTime::now()
                .duration_since(last)
                .is_ok_and(|elapsed| elapsed < self.write_interval)
        {
            debug!("Write of cache {} deferred by throttle", self.name);
            return Ok(());
        }

        self.flush()
    }

    /// Unthrottled write-back, used by close, checkpoints and validation.
    ///
    /// Reads the backing file first so entries written by a concurrent
    /// process are unioned in rather than overwritten, then rewrites the
    /// file in full.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.persistent || !self.dirty {
            return Ok(());
        }

        self.read()?;

        let content = serde_json::to_string(&self.data)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        fs::write(&self.path, content)?;

        self.last_seen_mtime = Some(fs::metadata(&self.path)?.modified()?);
        self.last_write = Some(SystemTime::now());
        self.dirty = false;

        info!(
            "Wrote {} cache entries to {}",
            self.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Computes the stamp expected under [`VALIDATION_KEY`].
///
/// Object stamps get the format version injected so a version bump also
/// invalidates caller-defined stamps.
fn validation_stamp(validate: Option<Value>) -> Value {
    match validate {
        Some(Value::Object(mut stamp)) => {
            stamp.insert("__version".to_string(), Value::from(FORMAT_VERSION));
            Value::Object(stamp)
        }
        Some(stamp) => stamp,
        None => Value::from(FORMAT_VERSION),
    }
}
