//! Shared Cache Module
//!
//! Thread-safe wrapper around a lazily created [`LruStore`] of [`ByteView`]s.

use parking_lot::Mutex;

use crate::cache::{ByteView, CacheStats, LruStore};

#[derive(Debug, Default)]
struct Slot {
    store: Option<LruStore<ByteView>>,
    /// Misses served before the store existed
    cold_misses: u64,
}

// == Shared Cache ==
/// The per-group cache. The store is created on first write with the byte
/// budget fixed at construction and is never resized.
#[derive(Debug)]
pub struct SharedCache {
    max_bytes: usize,
    slot: Mutex<Slot>,
}

impl SharedCache {
    /// Creates an empty cache; `max_bytes == 0` means unbounded.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Returns a shared view of the value, promoting it in the LRU order.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut slot = self.slot.lock();
        match slot.store.as_mut() {
            Some(store) => store.get(key).cloned(),
            None => {
                slot.cold_misses += 1;
                None
            }
        }
    }

    /// Inserts or replaces `key`, creating the store on first use.
    pub fn add(&self, key: &str, value: ByteView) {
        let mut slot = self.slot.lock();
        slot.store
            .get_or_insert_with(|| LruStore::new(self.max_bytes))
            .add(key.to_string(), value);
    }

    /// Byte budget of the store (0 = unbounded).
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.slot.lock().store.as_ref().map_or(0, LruStore::len)
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics snapshot, including misses seen before the first write.
    pub fn stats(&self) -> CacheStats {
        let slot = self.slot.lock();
        let mut stats = slot
            .store
            .as_ref()
            .map_or_else(CacheStats::new, LruStore::stats);
        stats.misses += slot.cold_misses;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_created_lazily() {
        let cache = SharedCache::new(64);

        assert!(cache.get("missing").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 1);

        cache.add("Tom", ByteView::from("630"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Tom"), Some(ByteView::from("630")));
        assert_eq!(cache.stats().used_bytes, 6);
    }

    #[test]
    fn test_misses_counted_before_and_after_first_write() {
        let cache = SharedCache::new(0);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());

        cache.add("a", ByteView::from("1"));
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_budget_fixed_at_construction() {
        let cache = SharedCache::new(8);
        cache.add("a", ByteView::from("1234"));
        cache.add("b", ByteView::from("5678"));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert_eq!(cache.max_bytes(), 8);
    }

    #[test]
    fn test_concurrent_adds() {
        let cache = std::sync::Arc::new(SharedCache::new(0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.add(&format!("{t}-{i}"), ByteView::from("v"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
