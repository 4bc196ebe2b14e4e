//! File-backed cache with expiry and schema versioning
//!
//! Every key maps to one file named by the hex SHA-256 of the key. A file
//! holds a JSON `{version, value}` entry; entries older than the TTL (by
//! modification time) or carrying another version are treated as misses.

use crate::cache::{Cache, CacheError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[derive(Serialize)]
struct EntryRef<'a, V> {
    version: &'a str,
    value: &'a V,
}

#[derive(Deserialize)]
struct Entry<V> {
    version: String,
    value: V,
}

#[derive(Debug)]
pub struct DiskCache<V> {
    root: PathBuf,
    version: String,
    ttl: Duration,
    _marker: PhantomData<fn() -> V>,
}

impl<V> DiskCache<V> {
    /// Open (and create if needed) a cache rooted at `root`
    pub fn open(
        root: impl Into<PathBuf>,
        version: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("Opened disk cache at {}", root.display());

        Ok(Self {
            root,
            version: version.into(),
            ttl,
            _marker: PhantomData,
        })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.root.join(format!("{:x}", hasher.finalize()))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }
}

impl<V> Cache<V> for DiskCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &str) -> Option<V> {
        let path = self.entry_path(key);
        if !self.is_fresh(&path) {
            return None;
        }

        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Entry<V>>(&contents) {
            Ok(entry) if entry.version == self.version => Some(entry.value),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    fn put(&self, key: &str, value: &V) -> Result<(), CacheError> {
        let entry = EntryRef {
            version: &self.version,
            value,
        };
        fs::write(self.entry_path(key), serde_json::to_vec(&entry)?)?;
        Ok(())
    }
}
