//! Daily weather cache.
//!
//! One slot per provider, keyed by the provider id. An entry is valid for the
//! rest of the calendar day it was fetched on, and only for the location it
//! was fetched for. Invalid entries are evicted eagerly on the read path
//! rather than lazily expired. Corrupt stored data is always treated as a
//! miss, never as an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::CanonicalWeather;
use crate::provider::ProviderId;

/// String-keyed persistent store the cache sits on top of.
///
/// Write and remove failures are non-fatal: a cache that cannot persist
/// degrades to refetching, it never fails a weather request.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// One JSON file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(error) = write_atomic(&self.path(key), value.as_bytes()) {
            warn!(key, %error, "failed to persist cache entry");
        }
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path(key));
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "cache path must have a parent directory",
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// In-memory store. Clones share the same map, which lets tests hand one
/// store to several service instances.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(key);
        }
    }
}

/// Stored cache entry: the normalized payload plus the calendar date and the
/// requested-location string it was fetched for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: CanonicalWeather,
    pub fetch_date: NaiveDate,
    /// The location string the caller asked for (city name or a "lat,lon"
    /// label), not the resolved display name.
    pub location: String,
}

impl CacheEntry {
    /// Valid iff fetched today and, when a location constraint is given, the
    /// requested location matches exactly.
    pub fn is_valid(&self, requested_location: Option<&str>, today: NaiveDate) -> bool {
        if self.fetch_date != today {
            return false;
        }
        match requested_location {
            None => true,
            Some(location) => self.location == location,
        }
    }
}

/// Per-provider cache slots over a [`KeyValueStore`].
///
/// Slots are independent: switching providers never evicts the other
/// provider's entry.
#[derive(Debug, Clone)]
pub struct CacheStore<S> {
    store: S,
}

impl<S: KeyValueStore> CacheStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Missing key or malformed stored data both read as a miss.
    pub fn read(&self, provider: ProviderId) -> Option<CacheEntry> {
        let raw = self.store.get(provider.as_str())?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(error) => {
                debug!(provider = %provider, %error, "discarding corrupt cache entry");
                None
            }
        }
    }

    /// Unconditionally overwrites any prior entry for the provider.
    pub fn write(
        &self,
        provider: ProviderId,
        payload: &CanonicalWeather,
        location: &str,
        today: NaiveDate,
    ) {
        let entry = CacheEntry {
            payload: payload.clone(),
            fetch_date: today,
            location: location.to_string(),
        };
        match serde_json::to_string(&entry) {
            Ok(serialized) => self.store.set(provider.as_str(), &serialized),
            Err(error) => warn!(provider = %provider, %error, "failed to serialize cache entry"),
        }
    }

    pub fn invalidate(&self, provider: ProviderId) {
        self.store.remove(provider.as_str());
    }
}
