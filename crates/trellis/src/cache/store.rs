//! Cache stores.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::CacheError;
use crate::error::ComponentError;

/// Storage for rendered fragments.
pub trait CacheStore: Send + Sync + fmt::Debug {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Returns the stored value for `key`, or renders, stores and returns a
    /// new one. A failed render stores nothing.
    fn fetch_or_store(
        &self,
        key: &str,
        render: &mut dyn FnMut() -> Result<String, ComponentError>,
    ) -> Result<String, ComponentError> {
        if let Some(hit) = self.read(key)? {
            tracing::debug!(key, "fragment cache hit");
            return Ok(hit);
        }
        tracing::debug!(key, "fragment cache miss");
        let value = render()?;
        self.write(key, &value)?;
        Ok(value)
    }
}

/// Hit and miss counts of a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Process-local store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Removes every entry and resets the statistics.
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl CacheStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let found = self.entries.lock().get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_or_store_renders_once() {
        let store = MemoryStore::new();
        let mut renders = 0;
        let mut render = || -> Result<String, ComponentError> {
            renders += 1;
            Ok("body".to_string())
        };

        assert_eq!(store.fetch_or_store("k", &mut render).unwrap(), "body");
        assert_eq!(store.fetch_or_store("k", &mut render).unwrap(), "body");
        drop(render);
        assert_eq!(renders, 1);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn failed_render_stores_nothing() {
        let store = MemoryStore::new();
        let err = store
            .fetch_or_store("k", &mut || Err(ComponentError::Aborted))
            .unwrap_err();
        assert!(err.is_aborted());
        assert!(store.is_empty());
    }

    #[test]
    fn clear_resets_stats() {
        let store = MemoryStore::new();
        store.write("a", "1").unwrap();
        store.read("a").unwrap();
        store.read("b").unwrap();
        assert_eq!(store.keys(), ["a".to_string()]);

        store.clear();
        assert_eq!(store.stats(), CacheStats::default());
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
