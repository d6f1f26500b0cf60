//! # wikinote_cache
//!
//! Persistent memoization cache for the WikiNote editing extension.
//!
//! This crate provides:
//! - A per-name [`Cache`] with optional JSON file persistence
//! - Staleness detection against a backing file shared across processes
//! - Throttled write-back bounding write amplification for hot keys
//! - A [`CacheRegistry`] guaranteeing one live instance per name
//! - Function memoization via [`memoize`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use wikinote_cache::{CacheConfig, CacheOptions, CacheRegistry};
//!
//! let mut registry = CacheRegistry::new(CacheConfig::default());
//! let links = registry.open("links", CacheOptions::default())?;
//!
//! links.set("index.md", serde_json::json!(["todo.md", "journal.md"]))?;
//! assert!(links.has("index.md")?);
//!
//! registry.write_all()?;
//! ```

mod cache;
mod config;
mod error;
mod memo;
mod namer;
mod registry;

pub use cache::{Cache, CacheOptions, VALIDATION_KEY};
pub use config::{CacheConfig, DEFAULT_WRITE_INTERVAL};
pub use error::CacheError;
pub use memo::{Memoized, memoize};
pub use namer::local_name;
pub use registry::{CacheHandle, CacheRegistry};
