//! In-process cache backed by a concurrent map

use crate::cache::{Cache, CacheError};
use dashmap::DashMap;

#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: DashMap<String, V>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &str, value: &V) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}
