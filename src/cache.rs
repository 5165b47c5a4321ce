//! Caching layer for derived explorer data
//!
//! The ledger never changes once generated, so aggregated address views can
//! be cached without invalidation. Capacity is bounded by an `lru::LruCache`,
//! but reads use `peek` under a shared lock and do not refresh recency, so
//! the entry evicted on overflow is the one inserted longest ago.
use crate::query::AddressDetails;
use lru::LruCache;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use std::hash::Hash;

/// Generic cache operations. `Borrow` lets lookups avoid cloning the key.
pub trait CacheInner<K, V> {
    /// Retrieve a value without touching recency (read lock friendly).
    fn get_non_mut<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq;

    fn put(&mut self, key: K, value: V);

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> CacheInner<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn get_non_mut<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    {
        self.peek(key)
    }

    fn put(&mut self, key: K, value: V) {
        LruCache::put(self, key, value);
    }

    fn clear(&mut self) {
        LruCache::clear(self);
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }
}

/// Thread-safe wrapper shared between request handlers.
pub struct ThreadSafeCache<K, V, T: CacheInner<K, V>> {
    cache: Arc<RwLock<T>>,
    _phantom_k: PhantomData<K>,
    _phantom_v: PhantomData<V>,
}

impl<K, V> ThreadSafeCache<K, V, LruCache<K, V>>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Capacity 0 is treated as 1.
    pub fn new_lru(capacity: usize) -> Self {
        let capacity_nz = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity_nz))),
            _phantom_k: PhantomData,
            _phantom_v: PhantomData,
        }
    }

    pub async fn capacity(&self) -> usize {
        self.cache.read().await.cap().get()
    }
}

impl<K, V, T: CacheInner<K, V>> ThreadSafeCache<K, V, T>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub async fn get<Q: ?Sized>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq,
    {
        let cache = self.cache.read().await;
        cache.get_non_mut(key).cloned()
    }

    pub async fn put(&self, key: K, value: V) {
        let mut cache = self.cache.write().await;
        cache.put(key, value);
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

impl<K, V, T: CacheInner<K, V>> Clone for ThreadSafeCache<K, V, T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            _phantom_k: PhantomData,
            _phantom_v: PhantomData,
        }
    }
}

/// Address aggregations keyed by lowercase address.
pub type AddressCache = ThreadSafeCache<String, AddressDetails, LruCache<String, AddressDetails>>;

impl AddressCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        Self::new_lru(capacity)
    }

    pub async fn lookup(&self, address: &str) -> Option<AddressDetails> {
        self.get(address.to_ascii_lowercase().as_str()).await
    }

    pub async fn store(&self, details: &AddressDetails) {
        self.put(details.address.to_ascii_lowercase(), details.clone())
            .await;
    }

    pub async fn stats(&self) -> (usize, usize) {
        (self.len().await, self.capacity().await)
    }
}
