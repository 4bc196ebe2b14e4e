//! Key-value caches placed in front of directory sources

pub mod disk;
pub mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A cache keyed by account id or identifier.
///
/// Implementations are injected into the fetchers; a miss is always safe and
/// simply sends the request to the underlying source.
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: &str, value: &V) -> Result<(), CacheError>;
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl<V> Cache<V> for NoCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn put(&self, _key: &str, _value: &V) -> Result<(), CacheError> {
        Ok(())
    }
}
