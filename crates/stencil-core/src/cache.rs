//! Bounded least-recently-used cache with eviction hooks.
//!
//! A thin layer over [`moka::sync::Cache`] with the LRU policy. Values leave
//! the cache in four ways, each reported to the optional [`CacheHook`]:
//! - **discard**: evicted as least-recently-used when the cache overflows
//! - **displace**: replaced by a `set` on the same key
//! - **remove**: dropped by [`Cache::remove`] or [`Cache::clear`]
//! - **destroy**: the cache itself is dropped
//!
//! Hooks run on whichever thread triggered the eviction, before the call
//! that caused it returns. They may block (e.g. delete a temporary file) but
//! must not call back into the cache.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;

/// Eviction notifications. All methods default to no-ops.
pub trait CacheHook<K, V>: Send + Sync {
    fn on_discard(&self, _key: &K, _value: &V) {}
    fn on_displace(&self, _key: &K, _value: &V) {}
    fn on_remove(&self, _key: &K, _value: &V) {}
    fn on_destroy(&self) {}
}

/// Thread-safe LRU map. `V` is usually an `Arc` so that `get` is cheap.
pub struct Cache<K, V> {
    inner: moka::sync::Cache<K, V>,
    capacity: usize,
    hook: Option<Arc<dyn CacheHook<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// Create a cache that reports evictions to `hook`.
    pub fn with_hook(capacity: usize, hook: Arc<dyn CacheHook<K, V>>) -> Self {
        Self::build(capacity, Some(hook))
    }

    fn build(capacity: usize, hook: Option<Arc<dyn CacheHook<K, V>>>) -> Self {
        let mut builder = moka::sync::Cache::builder()
            .max_capacity(capacity as u64)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(hook) = hook.clone() {
            builder = builder.eviction_listener(move |key: Arc<K>, value: V, cause| match cause {
                RemovalCause::Size => hook.on_discard(&key, &value),
                RemovalCause::Replaced => hook.on_displace(&key, &value),
                RemovalCause::Explicit => hook.on_remove(&key, &value),
                _ => {}
            });
        }
        Self {
            inner: builder.build(),
            capacity,
            hook,
        }
    }

    /// Look up `key`, marking it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.get(key)
    }

    /// `true` if `key` is cached. Does not touch recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Insert or replace `key`, evicting the least recently used entries on overflow.
    pub fn set(&self, key: K, value: V) {
        self.inner.insert(key, value);
        // Apply the capacity bound now rather than on a later access.
        self.inner.run_pending_tasks();
    }

    /// Drop `key`. Returns `true` if it was present.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
    }

    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        if let Some(hook) = &self.hook {
            hook.on_destroy();
        }
    }
}
