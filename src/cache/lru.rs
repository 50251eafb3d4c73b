//! LRU Store Module
//!
//! Byte-budgeted key/value store with least-recently-used eviction.
//!
//! Entries live in a slot arena linked into a doubly linked recency list:
//! - Head = Most recently used
//! - Tail = Least recently used
//!
//! Lookups, inserts, promotions and evictions are all O(1) amortized.

use std::collections::HashMap;
use std::fmt;

use crate::cache::CacheStats;

// == Weigh ==
/// Size of a value as charged against the byte budget.
pub trait Weigh {
    fn weight(&self) -> usize;
}

impl Weigh for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weigh for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with each evicted entry.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Store ==
/// Bounded-memory LRU store keyed by string.
///
/// `used_bytes` is the sum of `key.len() + value.weight()` over all entries.
/// After every mutation `used_bytes <= max_bytes`, unless `max_bytes == 0`,
/// which disables eviction entirely.
pub struct LruStore<V> {
    max_bytes: usize,
    used_bytes: usize,
    map: HashMap<String, usize>,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    stats: CacheStats,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: Weigh> LruStore<V> {
    // == Constructor ==
    /// Creates an empty store. `max_bytes == 0` means unbounded.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            map: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            stats: CacheStats::new(),
            on_evicted: None,
        }
    }

    /// Installs a callback run for every entry removed by eviction.
    pub fn with_eviction_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&str, &V) + Send + 'static,
    {
        self.on_evicted = Some(Box::new(callback));
        self
    }

    // == Get ==
    /// Looks up a key and promotes it to most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let Some(&idx) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };
        self.stats.record_hit();
        self.promote(idx);
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    // == Peek ==
    /// Looks up a key without touching recency or stats.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.slots[idx].as_ref().map(|node| &node.value)
    }

    // == Add ==
    /// Inserts or replaces a value, then evicts from the LRU end until the
    /// byte budget is met.
    pub fn add(&mut self, key: String, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = self.slots[idx].as_mut() {
                let old = node.value.weight();
                self.used_bytes = self.used_bytes - old + value.weight();
                node.value = value;
            }
            self.promote(idx);
        } else {
            self.used_bytes += key.len() + value.weight();
            let idx = self.alloc(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.map.insert(key, idx);
            self.attach_front(idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
        self.sync_occupancy();
    }

    // == Remove ==
    /// Removes a key without invoking the eviction callback.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = *self.map.get(key)?;
        let node = self.take(idx)?;
        self.sync_occupancy();
        Some(node.value)
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        let node = self.take(idx)?;
        self.stats.record_eviction();
        if let Some(callback) = self.on_evicted.as_mut() {
            callback(&node.key, &node.value);
        }
        self.sync_occupancy();
        Some((node.key, node.value))
    }

    // == Clear ==
    /// Drops every entry. The eviction callback is not invoked.
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.used_bytes = 0;
        self.sync_occupancy();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sum of key and value weights currently held.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Byte budget (0 = unbounded).
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns a snapshot of the store's counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.slots[idx].as_ref() else {
                break;
            };
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    // == Internal List Operations ==

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn take(&mut self, idx: usize) -> Option<Node<V>> {
        self.detach(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.map.remove(&node.key);
        self.used_bytes -= node.key.len() + node.value.weight();
        Some(node)
    }

    fn promote(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn links(&self, idx: usize) -> (Option<usize>, Option<usize>) {
        self.slots[idx]
            .as_ref()
            .map_or((None, None), |node| (node.prev, node.next))
    }

    fn set_links(&mut self, idx: usize, prev: Option<usize>, next: Option<usize>) {
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = prev;
            node.next = next;
        }
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = self.slots[idx].as_mut() {
            node.next = next;
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = self.links(idx);
        match prev {
            Some(p) => self.set_next(p, next),
            None if self.head == Some(idx) => self.head = next,
            None => {}
        }
        match next {
            Some(n) => self.set_prev(n, prev),
            None if self.tail == Some(idx) => self.tail = prev,
            None => {}
        }
        self.set_links(idx, None, None);
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.set_links(idx, None, old_head);
        if let Some(h) = old_head {
            self.set_prev(h, Some(idx));
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn sync_occupancy(&mut self) {
        self.stats.set_occupancy(self.map.len(), self.used_bytes);
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.map.len())
            .finish()
    }
}
