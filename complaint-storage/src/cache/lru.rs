//! Fixed-capacity LRU map with O(1) get, put and eviction.
//!
//! Entries live in a dense arena (`Vec`) and form a doubly-linked recency
//! list through arena indices; a `HashMap` maps keys to their slot. Removing
//! a slot swaps the last arena entry into the hole and patches its links,
//! so the arena never holds tombstones.
//!
//! The structure is single-threaded. [`SharedLruCache`](super::SharedLruCache)
//! owns the lock.

use super::CacheStats;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    /// Toward the most recently used end.
    prev: Option<usize>,
    /// Toward the least recently used end.
    next: Option<usize>,
}

/// Bounded key/value cache with least-recently-used eviction.
#[derive(Debug)]
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    max_size: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Create an empty cache holding at most `max_size` entries.
    ///
    /// A cache with `max_size == 0` stores nothing; every `get` misses.
    pub fn new(max_size: usize) -> Self {
        Self {
            map: HashMap::with_capacity(max_size.min(4096)),
            nodes: Vec::with_capacity(max_size.min(4096)),
            head: None,
            tail: None,
            max_size,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    ///
    /// Never populates on miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.map.get(key).copied() {
            Some(idx) => {
                self.hits += 1;
                self.promote(idx);
                Some(&self.nodes[idx].value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching recency or counters.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|&idx| &self.nodes[idx].value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or replace `key`, marking it most recently used.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry, the
    /// least recently used, and returns it.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.max_size == 0 {
            return None;
        }
        if let Some(idx) = self.map.get(&key).copied() {
            self.nodes[idx].value = value;
            self.promote(idx);
            return None;
        }

        let evicted = match self.tail {
            Some(lru) if self.map.len() >= self.max_size => {
                self.evictions += 1;
                Some(self.remove_index(lru))
            }
            _ => None,
        };

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.push_front(idx);
        evicted
    }

    /// Remove `key`. No-op when absent.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let idx = self.map.get(key).copied()?;
        Some(self.remove_index(idx).1)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Zero hit, miss and eviction counters. Entries are kept.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.map.len(),
            max_size: self.max_size,
        }
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(self.nodes[idx].key.clone());
            cursor = self.nodes[idx].next;
        }
        keys
    }

    // === Linked list plumbing ===

    fn promote(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.detach(idx);
            self.push_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Unlink and remove the node at `idx`, back-filling the hole with the
    /// last arena entry.
    fn remove_index(&mut self, idx: usize) -> (K, V) {
        self.detach(idx);
        let node = self.nodes.swap_remove(idx);
        self.map.remove(&node.key);

        if idx < self.nodes.len() {
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.map.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }
        (node.key, node.value)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let mut cache = LruCache::new(4);
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_miss_counts_and_does_not_populate() {
        let mut cache: LruCache<&str, i32> = LruCache::new(4);
        assert_eq!(cache.get(&"missing"), None);
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_two_evicts_first_insert() {
        let mut cache = LruCache::new(2);
        cache.put("A", 1);
        cache.put("B", 2);
        let evicted = cache.put("C", 3);
        assert_eq!(evicted, Some(("A", 1)));

        assert_eq!(cache.get(&"A"), None);
        assert_eq!(cache.get(&"B"), Some(&2));
        assert_eq!(cache.get(&"C"), Some(&3));

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_size, 2);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.put("A", 1);
        cache.put("B", 2);
        cache.get(&"A");
        cache.put("C", 3);
        assert!(cache.contains(&"A"));
        assert!(!cache.contains(&"B"));
    }

    #[test]
    fn test_update_replaces_value_without_eviction() {
        let mut cache = LruCache::new(2);
        cache.put("A", 1);
        cache.put("B", 2);
        assert_eq!(cache.put("A", 10), None);
        assert_eq!(cache.peek(&"A"), Some(&10));
        assert_eq!(cache.keys_by_recency(), vec!["A", "B"]);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_delete_middle_keeps_links() {
        let mut cache = LruCache::new(4);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            cache.put(k, v);
        }
        assert_eq!(cache.delete(&"b"), Some(2));
        assert_eq!(cache.delete(&"b"), None);
        assert_eq!(cache.keys_by_recency(), vec!["d", "c", "a"]);
        cache.put("e", 5);
        cache.put("f", 6);
        assert_eq!(cache.keys_by_recency(), vec!["f", "e", "d", "c"]);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.put("a", 1), None);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear_and_reset_stats() {
        let mut cache = LruCache::new(2);
        cache.put("a", 1);
        cache.get(&"a");
        cache.get(&"z");
        cache.reset_stats();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys_by_recency().is_empty());
        cache.put("b", 2);
        assert_eq!(cache.get(&"b"), Some(&2));
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================
