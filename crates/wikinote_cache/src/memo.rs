//! Function memoization backed by a registry cache.

use serde_json::Value;

use crate::{CacheError, CacheHandle, CacheOptions, CacheRegistry};

/// A single-argument function wrapped with get-or-compute-and-store
/// semantics.
///
/// Results persist across sessions through the cache obtained from the
/// registry at wrap time.
pub struct Memoized<F> {
    cache: CacheHandle,
    func: F,
}

/// Wraps `func` with a cache resolved (or constructed) through `registry`.
///
/// ```rust,ignore
/// let word_count = memoize(&mut registry, "word-count", CacheOptions::default(), |text| {
///     serde_json::json!(text.split_whitespace().count())
/// })?;
/// assert_eq!(word_count.call("one two three")?, serde_json::json!(3));
/// ```
pub fn memoize<F>(
    registry: &mut CacheRegistry,
    name: &str,
    opts: CacheOptions,
    func: F,
) -> Result<Memoized<F>, CacheError>
where
    F: Fn(&str) -> Value,
{
    let cache = registry.open(name, opts)?;
    Ok(Memoized { cache, func })
}

impl<F> Memoized<F>
where
    F: Fn(&str) -> Value,
{
    /// Returns the cached result for `key`, computing and storing it on a
    /// miss.
    pub fn call(&self, key: &str) -> Result<Value, CacheError> {
        let mut cache = self.cache.lock();
        if cache.has(key)?
            && let Some(value) = cache.get(key)?
        {
            return Ok(value);
        }

        let value = (self.func)(key);
        cache.set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::tempdir;

    #[test]
    fn test_computes_once_per_key() {
        let dir = tempdir().unwrap();
        let mut registry = CacheRegistry::new(CacheConfig::with_root(dir.path()));

        let calls = Cell::new(0);
        let upper = memoize(&mut registry, "upper", CacheOptions::default(), |key| {
            calls.set(calls.get() + 1);
            json!(key.to_uppercase())
        })
        .unwrap();

        assert_eq!(upper.call("abc").unwrap(), json!("ABC"));
        assert_eq!(upper.call("abc").unwrap(), json!("ABC"));
        assert_eq!(calls.get(), 1);

        assert_eq!(upper.call("xyz").unwrap(), json!("XYZ"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_results_survive_reopen() {
        let dir = tempdir().unwrap();

        {
            let mut registry = CacheRegistry::new(CacheConfig::with_root(dir.path()));
            let length = memoize(&mut registry, "length", CacheOptions::default(), |key| {
                json!(key.len())
            })
            .unwrap();
            assert_eq!(length.call("four").unwrap(), json!(4));
        }

        let mut registry = CacheRegistry::new(CacheConfig::with_root(dir.path()));
        let calls = Cell::new(0);
        let length = memoize(&mut registry, "length", CacheOptions::default(), |key| {
            calls.set(calls.get() + 1);
            json!(key.len())
        })
        .unwrap();

        assert_eq!(length.call("four").unwrap(), json!(4));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_shares_the_registry_instance() {
        let dir = tempdir().unwrap();
        let mut registry = CacheRegistry::new(CacheConfig::with_root(dir.path()));

        let wrapped = memoize(&mut registry, "shared", CacheOptions::default(), |_| {
            json!("computed")
        })
        .unwrap();
        wrapped.call("key").unwrap();

        let cache = registry.open("shared", CacheOptions::default()).unwrap();
        assert_eq!(cache.get("key").unwrap(), Some(json!("computed")));
    }
}
