//! # Cache — bounded LRU hot-set
//!
//! A fixed-capacity, least-recently-used cache mapping `key -> value`,
//! coherent with whatever the [`Store` facade](../store/struct.Store.html)
//! has most recently committed to the engine.
//!
//! The cache never originates durable state: it is only ever populated from
//! a value the caller already committed (a `put`) or already read back from
//! the engine (a cache-miss fill). Eviction is LRU on any access — a read hit
//! promotes, a write promotes, and capacity overflow evicts the
//! least-recently-used entry.
//!
//! ## Example
//! ```rust
//! use cache::HotCache;
//!
//! let cache = HotCache::new(2);
//! cache.put(b"a".to_vec(), b"1".to_vec());
//! cache.put(b"b".to_vec(), b"2".to_vec());
//! assert_eq!(cache.get(b"a"), Some(b"1".to_vec()));
//!
//! // "b" is now least-recently-used; inserting a third key evicts it.
//! cache.put(b"c".to_vec(), b"3".to_vec());
//! assert_eq!(cache.get(b"b"), None);
//! ```

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Default capacity used when no `CACHE_SIZE` override is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A bounded LRU cache shared by every request handler.
///
/// A single `parking_lot::Mutex` serializes updates so that recency metadata
/// and capacity accounting stay consistent under concurrent access, matching
/// how the rest of this workspace guards shared state (see `store::facade`).
pub struct HotCache {
    inner: Mutex<LruCache<Vec<u8>, Vec<u8>>>,
}

impl HotCache {
    /// Creates a cache with room for `capacity` entries. `capacity` of `0` is
    /// coerced up to `1` (an `LruCache` cannot be zero-sized).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().get(key).cloned()
    }

    /// Inserts or overwrites `key`, marking it most-recently-used. If the
    /// cache is at capacity this evicts the current least-recently-used
    /// entry.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.lock().put(key, value);
    }

    /// Evicts `key` if present; a no-op otherwise.
    pub fn remove(&self, key: &[u8]) {
        self.inner.lock().pop(key);
    }

    /// Current number of entries held.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
