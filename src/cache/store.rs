//! Cache storage implementations.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::{debug, info};

use super::config::CacheConfig;
use super::keys::{FeedFingerprint, namespace_prefix, namespaced_key};
use super::lock::{rw_read, rw_write};
use super::metrics::{
    FEED_CACHE_HIT, FEED_CACHE_INVALIDATION, FEED_CACHE_MISS, FEED_CACHE_STORE,
};

const SOURCE: &str = "cache::store";

/// Namespaced string storage with per-entry expiry.
///
/// Implementations are called synchronously from request handlers and from
/// mutation paths, so every method must be cheap and non-blocking.
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, unless absent or expired.
    fn get(&self, namespace: &str, key: &str) -> Option<String>;

    /// Store `value` for `ttl`; a later put to the same key replaces it.
    fn put(&self, namespace: &str, key: &str, value: String, ttl: Duration);

    /// Remove every entry of `namespace`, expired or not. Returns the number removed.
    fn clear_namespace(&self, namespace: &str) -> usize;
}

struct CacheEntry {
    value: String,
    /// `None` when the TTL overflows the clock; such entries never expire.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

/// In-process store with LRU eviction and lazy expiry.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn get_at(&self, namespace: &str, key: &str, now: Instant) -> Option<String> {
        let storage_key = namespaced_key(namespace, key);
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let expired = match entries.get(&storage_key) {
            Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(&storage_key);
        }
        None
    }

    pub(crate) fn put_at(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Duration,
        now: Instant,
    ) {
        let entry = CacheEntry {
            value,
            expires_at: now.checked_add(ttl),
        };
        rw_write(&self.entries, SOURCE, "put").put(namespaced_key(namespace, key), entry);
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.get_at(namespace, key, Instant::now())
    }

    fn put(&self, namespace: &str, key: &str, value: String, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.put_at(namespace, key, value, ttl, Instant::now());
    }

    fn clear_namespace(&self, namespace: &str) -> usize {
        let prefix = namespace_prefix(namespace);
        let mut entries = rw_write(&self.entries, SOURCE, "clear_namespace");

        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }
}

/// The feed's view of a [`CacheStore`], bound to one namespace.
#[derive(Clone)]
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
    namespace: String,
}

impl FeedCache {
    pub fn new(store: Arc<dyn CacheStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, fingerprint: &FeedFingerprint) -> Option<String> {
        let cached = self.store.get(&self.namespace, fingerprint.as_str());
        match cached {
            Some(_) => {
                counter!(FEED_CACHE_HIT).increment(1);
                debug!(target = "postdown::cache", %fingerprint, "Feed cache hit");
            }
            None => {
                counter!(FEED_CACHE_MISS).increment(1);
                debug!(target = "postdown::cache", %fingerprint, "Feed cache miss");
            }
        }
        cached
    }

    pub fn put(&self, fingerprint: &FeedFingerprint, text: String, ttl: Duration) {
        counter!(FEED_CACHE_STORE).increment(1);
        debug!(
            target = "postdown::cache",
            %fingerprint,
            ttl_secs = ttl.as_secs(),
            bytes = text.len(),
            "Feed cached"
        );
        self.store
            .put(&self.namespace, fingerprint.as_str(), text, ttl);
    }

    /// Drop every cached feed regardless of configuration or expiry.
    pub fn invalidate_all(&self) -> usize {
        let removed = self.store.clear_namespace(&self.namespace);
        counter!(FEED_CACHE_INVALIDATION).increment(1);
        info!(
            target = "postdown::cache",
            namespace = %self.namespace,
            removed,
            "Feed cache invalidated"
        );
        removed
    }
}

impl std::fmt::Debug for FeedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
