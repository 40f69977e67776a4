use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The get/set/has contract the schema loading layer caches through.
///
/// Storage, expiry and eviction are the backing cache's business; a store
/// only bridges call shapes. Stores swallow backend failures: a cache that
/// cannot answer behaves like a miss.
pub trait CacheStore: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String, ttl: Option<Duration>);
}

/// Wraps a caller-owned cache object into a [`CacheStore`]
pub trait CacheAdapter {
    /// The external cache type this adapter knows how to drive
    type Cache;

    fn wrap(&self, cache: Self::Cache) -> Arc<dyn CacheStore>;
}

/// A plain map shared between the caller and the store
pub type SharedMap = Arc<Mutex<HashMap<String, String>>>;

/// Adapter for [`SharedMap`]. The map has no notion of expiry, so ttls are
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashMapCacheAdapter;

struct HashMapStore {
    map: SharedMap,
}

impl CacheStore for HashMapStore {
    fn has(&self, key: &str) -> bool {
        self.map
            .lock()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok().and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: String, _ttl: Option<Duration>) {
        match self.map.lock() {
            Ok(mut map) => {
                map.insert(key.to_string(), value);
            }
            Err(_) => tracing::warn!(key = %key, "Cache map lock poisoned, entry not stored"),
        }
    }
}

impl CacheAdapter for HashMapCacheAdapter {
    type Cache = SharedMap;

    fn wrap(&self, cache: SharedMap) -> Arc<dyn CacheStore> {
        Arc::new(HashMapStore { map: cache })
    }
}
