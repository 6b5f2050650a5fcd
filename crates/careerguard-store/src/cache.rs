//! # Namespaced Local Cache
//!
//! A small persistent key/value cache where every entry carries its own
//! expiry. It is the server-side counterpart of browser local storage: one
//! shared store, many namespaces, JSON values.
//!
//! ## Storage Structure
//!
//! All namespaces share a single Sled tree:
//!
//! | Tree | Key | Value |
//! |------|-----|-------|
//! | `local_cache` | `namespace:key` | `{"value": .., "expiry": ms, "timestamp": ms}` |
//!
//! Timestamps are Unix epoch milliseconds.
//!
//! ## Failure Policy
//!
//! The cache never raises. Writes report `false` on failure; reads treat
//! expired, corrupt or mistyped entries as absent and delete them. Those
//! deletions only go through if the stored bytes are still the ones that
//! were judged stale, so a concurrent `set` is never lost.
//!
//! ## Example
//!
//! ```rust
//! use careerguard_store::LocalCache;
//! use chrono::Duration;
//!
//! let cache = LocalCache::temporary("resume-drafts").unwrap();
//!
//! assert!(cache.set("draft-1", &vec!["Rust", "Go"], Duration::minutes(10)));
//! let skills: Option<Vec<String>> = cache.get("draft-1");
//! assert_eq!(skills.unwrap(), vec!["Rust", "Go"]);
//! ```

use std::path::Path;

use careerguard_clock::{SharedClock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Tree shared by every cache namespace.
const CACHE_TREE: &str = "local_cache";

/// Default entry lifetime when none is given.
pub const DEFAULT_CACHE_TTL_SECS: i64 = 3_600;

/// Stored envelope around a cached value.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    value: T,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    expiry: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

/// Namespaced, TTL-expiring key/value cache over Sled.
///
/// Cloning is cheap and yields a handle onto the same store.
#[derive(Clone)]
pub struct LocalCache {
    tree: sled::Tree,
    namespace: String,
    default_ttl: Duration,
    clock: SharedClock,
}

impl LocalCache {
    /// Opens (or creates) a cache store at `path` and binds `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the store cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db, namespace)
    }

    /// Creates a cache over a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the store cannot be created.
    pub fn temporary(namespace: &str) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db, namespace)
    }

    /// Binds `namespace` on an already-open store.
    ///
    /// Several caches built from the same `db` share one key space and are
    /// kept apart only by their namespace prefix.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the cache tree cannot be opened.
    pub fn from_db(db: &sled::Db, namespace: &str) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree(CACHE_TREE)?,
            namespace: namespace.to_string(),
            default_ttl: Duration::seconds(DEFAULT_CACHE_TTL_SECS),
            clock: SystemClock::shared(),
        })
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the TTL used by [`set_default`](Self::set_default).
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// The namespace this handle is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Stores `value` under `key` for `ttl`.
    ///
    /// A zero or negative `ttl` stores an entry that is already expired.
    /// Returns `false` if serialization or the write fails.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expiry: now.checked_add_signed(ttl).unwrap_or(if ttl < Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            }),
            timestamp: now,
        };

        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cache serialization failed for '{}': {}", key, e);
                return false;
            }
        };

        match self.tree.insert(self.full_key(key).as_bytes(), bytes) {
            Ok(_) => true,
            Err(e) => {
                warn!("Cache write failed for '{}': {}", key, e);
                false
            }
        }
    }

    /// Stores `value` under `key` for the default TTL.
    pub fn set_default<T: Serialize>(&self, key: &str, value: &T) -> bool {
        self.set(key, value, self.default_ttl)
    }

    /// Reads `key`, deleting it if it has expired or cannot be decoded as `T`.
    ///
    /// An entry is live strictly before its expiry instant.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let bytes = match self.tree.get(full_key.as_bytes()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for '{}': {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Dropping undecodable cache entry '{}': {}", key, e);
                self.remove_if_unchanged(full_key.as_bytes(), &bytes);
                return None;
            }
        };

        if self.clock.now() >= entry.expiry {
            debug!("Cache entry '{}' expired", key);
            self.remove_if_unchanged(full_key.as_bytes(), &bytes);
            return None;
        }

        Some(entry.value)
    }

    /// Deletes `full_key` only while it still holds `seen`.
    fn remove_if_unchanged(&self, full_key: &[u8], seen: &[u8]) -> bool {
        match self
            .tree
            .compare_and_swap(full_key, Some(seen), None as Option<&[u8]>)
        {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                debug!("Cache entry rewritten before stale removal, keeping it");
                false
            }
            Err(e) => {
                warn!("Cache delete failed: {}", e);
                false
            }
        }
    }

    /// Deletes `key`. Returns `true` if an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        match self.tree.remove(self.full_key(key).as_bytes()) {
            Ok(removed) => removed.is_some(),
            Err(e) => {
                warn!("Cache delete failed for '{}': {}", key, e);
                false
            }
        }
    }

    /// Deletes every entry in this namespace. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let keys: Vec<sled::IVec> = self
            .tree
            .scan_prefix(self.prefix().as_bytes())
            .keys()
            .filter_map(|k| k.ok())
            .collect();

        keys.iter()
            .filter(|k| matches!(self.tree.remove(k), Ok(Some(_))))
            .count()
    }

    /// Lists this namespace's keys (without the prefix), expired ones included.
    pub fn get_keys(&self) -> Vec<String> {
        let prefix = self.prefix();
        self.tree
            .scan_prefix(prefix.as_bytes())
            .keys()
            .filter_map(|k| k.ok())
            .filter_map(|k| {
                std::str::from_utf8(&k)
                    .ok()
                    .and_then(|s| s.strip_prefix(prefix.as_str()))
                    .map(str::to_string)
            })
            .collect()
    }

    /// Deletes expired and undecodable entries in this namespace.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let stale: Vec<(sled::IVec, sled::IVec)> = self
            .tree
            .scan_prefix(self.prefix().as_bytes())
            .filter_map(|item| item.ok())
            .filter(|(_, bytes)| {
                match serde_json::from_slice::<CacheEntry<IgnoredAny>>(bytes) {
                    Ok(entry) => now >= entry.expiry,
                    Err(_) => true,
                }
            })
            .collect();

        let purged = stale
            .iter()
            .filter(|(key, bytes)| self.remove_if_unchanged(key, bytes))
            .count();
        if purged > 0 {
            debug!("Purged {} stale entries from '{}'", purged, self.namespace);
        }
        purged
    }

    /// Flushes pending writes to disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("namespace", &self.namespace)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
