/*!
 * Key-value cache contract used for session snapshots.
 *
 * The real store lives outside this crate (browser storage, a database, ...).
 * `MemoryCacheStore` is the in-process implementation used by default and in
 * tests: entries expire after their time to live, last write wins.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::CacheError;

/// Cache collaborator
///
/// `get` answers `Ok(None)` for a missing or expired key. A store that reports
/// `success: false` maps it to `CacheError::Rejected`.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store `value` under `key` for `ttl_seconds`
    async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<(), CacheError>;
}

/// Typed read on top of a [`CacheStore`]
pub async fn get_typed<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Typed write on top of a [`CacheStore`]
pub async fn set_typed<T: Serialize + Sync>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl_seconds: u64,
) -> Result<(), CacheError> {
    let value = serde_json::to_value(value)?;
    cache.set(key, value, ttl_seconds).await
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory cache with per-entry expiry
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|e| !e.is_expired(now)).count()
    }

    /// Check if the cache holds no live entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
        debug!("Memory cache cleared");
    }

    /// Raw read without going through the async contract
    pub fn peek(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    debug!("Cache hit for '{}'", key);
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write().remove(key);
            debug!("Cache entry '{}' expired", key);
        } else {
            debug!("Cache miss for '{}'", key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<(), CacheError> {
        let expires_at = (ttl_seconds > 0).then(|| Instant::now() + Duration::from_secs(ttl_seconds));
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        debug!("Cached '{}' for {}s", key, ttl_seconds);
        Ok(())
    }
}
