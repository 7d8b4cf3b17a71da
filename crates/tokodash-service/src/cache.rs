//! # Query Cache
//!
//! Short-lived cache for dashboard reads.
//!
//! ## Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_fetch("sales:{\"range\":...}", fetch)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  entry exists and now < fetched_at + ttl ?                              │
//! │       │ yes                          │ no                               │
//! │       ▼                              ▼                                  │
//! │  return Arc<V> (same pointer)    fetch().await                          │
//! │                                      │ Ok(v)           │ Err(e)         │
//! │                                      ▼                 ▼                │
//! │                                  overwrite entry   return e, cache      │
//! │                                  return Arc<V>     untouched            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are never evicted, only overwritten or invalidated, so the key
//! space must stay bounded (a handful of dashboard widgets per tenant).
//! Writes elsewhere do not invalidate anything; callers do that explicitly.
//!
//! The lock is not held across `fetch`, so two concurrent misses on one key
//! both fetch and the later write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::trace;

/// Separates the table prefix from the serialized query in a key.
const KEY_SEPARATOR: char = ':';

/// Builds a cache key from a table name and a serializable query description.
///
/// ## Example
/// ```rust
/// use tokodash_core::SaleFilter;
/// use tokodash_service::cache::cache_key;
///
/// let key = cache_key("sales", &SaleFilter::default()).unwrap();
/// assert!(key.starts_with("sales:"));
/// ```
pub fn cache_key<Q: Serialize + ?Sized>(table: &str, query: &Q) -> serde_json::Result<String> {
    Ok(format!("{table}{KEY_SEPARATOR}{}", serde_json::to_string(query)?))
}

struct CacheEntry<V> {
    value: Arc<V>,
    fetched_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.fetched_at + self.ttl
    }
}

/// TTL cache of fetched query results.
pub struct QueryCache<V> {
    default_ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> QueryCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        QueryCache {
            default_ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached value for `key` if it is still fresh.
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if entry.is_fresh(Instant::now()) {
            trace!(key = %key, "cache hit");
            Some(Arc::clone(&entry.value))
        } else {
            trace!(key = %key, "cache entry expired");
            None
        }
    }

    /// Returns the fresh cached value or fetches, stores, and returns a new one.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: String, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_fetch_with_ttl(key, self.default_ttl, fetch).await
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) with a per-entry TTL.
    pub async fn get_or_fetch_with_ttl<F, Fut, E>(
        &self,
        key: String,
        ttl: Duration,
        fetch: F,
    ) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        trace!(key = %key, "cache miss, fetching");
        let value = Arc::new(fetch().await?);

        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                fetched_at: Instant::now(),
                ttl,
            },
        );

        Ok(value)
    }

    /// Drops one entry. Returns whether it existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drops every entry keyed under `table`. Returns how many were removed.
    pub async fn invalidate_table(&self, table: &str) -> usize {
        let prefix = format!("{table}{KEY_SEPARATOR}");
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of entries, fresh or expired.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
