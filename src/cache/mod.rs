use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use uuid::Uuid;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Size-bounded cache with per-entry TTL and explicit invalidation, keyed by
/// user id. Stale entries are dropped on read; the LRU bound evicts the
/// coldest entry once capacity is reached.
pub struct TtlLruCache<V> {
    entries: Mutex<LruCache<Uuid, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlLruCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Fresh value for `key`, if present. Expired entries are removed and
    /// reported as a miss.
    pub fn get(&self, key: &Uuid) -> Option<V> {
        let mut entries = self.entries.lock();
        let hit = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };
        if hit.is_none() {
            entries.pop(key);
        }
        hit
    }

    pub fn insert(&self, key: Uuid, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().put(key, entry);
    }

    /// Remove the entry for `key`, if any. Called by every write path that
    /// changes the data a cached value was derived from.
    pub fn invalidate(&self, key: &Uuid) {
        self.entries.lock().pop(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn hit_within_ttl() {
        let cache = TtlLruCache::new(8, Duration::from_secs(60));
        let k = key();
        cache.insert(k, 42u32);
        assert_eq!(cache.get(&k), Some(42));
    }

    #[test]
    fn expired_entries_miss_and_are_dropped() {
        let cache = TtlLruCache::new(8, Duration::from_millis(0));
        let k = key();
        cache.insert(k, 42u32);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&k), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_bound_evicts_coldest() {
        let cache = TtlLruCache::new(2, Duration::from_secs(60));
        let (a, b, c) = (key(), key(), key());
        cache.insert(a, 1u32);
        cache.insert(b, 2);
        // Touch `a` so `b` is the eviction candidate
        assert_eq!(cache.get(&a), Some(1));
        cache.insert(c, 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&b), None);
        assert_eq!(cache.get(&a), Some(1));
        assert_eq!(cache.get(&c), Some(3));
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = TtlLruCache::new(8, Duration::from_secs(60));
        let k = key();
        cache.insert(k, 7u32);
        cache.invalidate(&k);
        assert_eq!(cache.get(&k), None);
        // A fresh insert after invalidation is served again
        cache.insert(k, 8);
        assert_eq!(cache.get(&k), Some(8));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = TtlLruCache::new(0, Duration::from_secs(60));
        let k = key();
        cache.insert(k, 1u32);
        assert_eq!(cache.get(&k), Some(1));
    }
}
