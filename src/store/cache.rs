use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// Small read-through cache for hot records, shared across request tasks.
/// Writers must invalidate after mutating the backing row.
pub struct ReadCache<K: std::hash::Hash + Eq, V: Clone> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: std::hash::Hash + Eq, V: Clone> ReadCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        ReadCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().await.get(key).cloned()
    }

    pub async fn put(&self, key: K, value: V) {
        self.inner.lock().await.put(key, value);
    }

    pub async fn invalidate(&self, key: &K) {
        self.inner.lock().await.pop(key);
    }
}
