//! LRU + TTL store implementation
//!
//! A `HashMap` indexes into a slab of list nodes linked by slot index, giving
//! O(1) lookup, O(1) move-to-front, and O(1) evict-tail. Head is the most
//! recently used entry, tail the least. Freed slots go on a free list and are
//! reused by later inserts; a freed slot is live again only once the map
//! points at it.
//!
//! Expiration is lazy: every read-side operation removes the entry it
//! observes to be expired. `sweep` additionally walks a bounded sample of
//! slots so long-idle entries are eventually collected.

use std::collections::HashMap;

use super::{Entry, StoreStats};

/// Sentinel index for list ends and unlinked nodes
const NIL: usize = usize::MAX;

struct Node {
    key: String,
    entry: Entry,
    prev: usize,
    next: usize,
}

/// Bounded in-memory key-value store with LRU eviction and TTL expiration
pub struct Store {
    /// Key to slot index
    map: HashMap<String, usize>,

    /// Slab of list nodes; slots on the free list hold stale data
    slots: Vec<Node>,

    /// Reusable slot indices
    free: Vec<usize>,

    /// Most recently used slot
    head: usize,

    /// Least recently used slot
    tail: usize,

    /// Capacity bound
    max_keys: usize,

    /// Next slot examined by `sweep`
    cursor: usize,

    stats: StoreStats,
}

impl Store {
    /// Create a store holding at most `max_keys` entries.
    ///
    /// # Panics
    /// Panics if `max_keys` is zero.
    pub fn new(max_keys: usize) -> Self {
        assert!(max_keys > 0, "max_keys must be positive");
        Self {
            map: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            max_keys,
            cursor: 0,
            stats: StoreStats::default(),
        }
    }

    // =========================================================================
    // Public Operations
    // =========================================================================

    /// Insert or update a key.
    ///
    /// An existing key is updated in place: new value, fresh deadline, moved
    /// to most-recently-used. A new key at capacity first evicts the LRU
    /// entry. Always succeeds.
    pub fn put(&mut self, key: &str, value: &str, ttl_secs: u32) -> bool {
        if let Some(&idx) = self.map.get(key) {
            self.slots[idx].entry = Entry::new(value, ttl_secs);
            self.touch(idx);
            return true;
        }

        if self.map.len() == self.max_keys {
            self.evict_lru();
        }

        let idx = self.alloc(key.to_string(), Entry::new(value, ttl_secs));
        self.attach_front(idx);
        self.map.insert(key.to_string(), idx);
        true
    }

    /// Look up a key, refreshing its recency on a hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let idx = match self.map.get(key) {
            Some(&idx) => idx,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if self.slots[idx].entry.is_expired() {
            self.remove_at(idx);
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        self.touch(idx);
        self.stats.record_hit();
        Some(self.slots[idx].entry.value.clone())
    }

    /// Remove a key. Returns whether a live entry was removed.
    ///
    /// An expired entry counts as absent (and is removed on observation).
    pub fn delete(&mut self, key: &str) -> bool {
        let idx = match self.map.get(key) {
            Some(&idx) => idx,
            None => return false,
        };

        let expired = self.slots[idx].entry.is_expired();
        self.remove_at(idx);
        if expired {
            self.stats.record_expiration();
        }
        !expired
    }

    /// Check for a key without touching its recency.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn exists(&mut self, key: &str) -> bool {
        let idx = match self.map.get(key) {
            Some(&idx) => idx,
            None => return false,
        };

        if self.slots[idx].entry.is_expired() {
            self.remove_at(idx);
            self.stats.record_expiration();
            return false;
        }
        true
    }

    /// Examine up to `sample` slots and drop the expired entries found.
    ///
    /// The scan resumes where the previous call stopped, so repeated small
    /// sweeps cover the whole slab. Returns the number of entries removed.
    pub fn sweep(&mut self, sample: usize) -> usize {
        if self.slots.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for _ in 0..sample.min(self.slots.len()) {
            let idx = self.cursor % self.slots.len();
            self.cursor = (idx + 1) % self.slots.len();

            if self.is_live(idx) && self.slots[idx].entry.is_expired() {
                self.remove_at(idx);
                self.stats.record_expiration();
                removed += 1;
            }
        }
        removed
    }

    /// Current number of live entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured capacity
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.cursor = 0;
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            len: self.map.len(),
            max_keys: self.max_keys,
            ..self.stats.clone()
        }
    }

    // =========================================================================
    // Recency List Internals
    // =========================================================================

    fn alloc(&mut self, key: String, entry: Entry) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Node {
                    key,
                    entry,
                    prev: NIL,
                    next: NIL,
                };
                idx
            }
            None => {
                self.slots.push(Node {
                    key,
                    entry,
                    prev: NIL,
                    next: NIL,
                });
                self.slots.len() - 1
            }
        }
    }

    fn attach_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn remove_at(&mut self, idx: usize) {
        self.detach(idx);
        self.map.remove(&self.slots[idx].key);
        self.free.push(idx);
    }

    fn evict_lru(&mut self) {
        let idx = self.tail;
        if idx == NIL {
            return;
        }
        tracing::trace!(key = %self.slots[idx].key, "evicting LRU entry");
        self.remove_at(idx);
        self.stats.record_eviction();
    }

    /// A slot is live when the map still points at it.
    fn is_live(&self, idx: usize) -> bool {
        self.map.get(&self.slots[idx].key) == Some(&idx)
    }

    // =========================================================================
    // Test Support
    // =========================================================================

    /// Verify the map/list bijection and the capacity bound.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.map.len() <= self.max_keys, "capacity bound violated");

        // Walk the list forward, checking link consistency
        let mut seen = std::collections::HashSet::new();
        let mut idx = self.head;
        let mut prev = NIL;
        while idx != NIL {
            assert_eq!(self.slots[idx].prev, prev, "broken prev link at {idx}");
            assert_eq!(
                self.map.get(&self.slots[idx].key),
                Some(&idx),
                "list node not in map"
            );
            assert!(seen.insert(idx), "cycle in recency list at {idx}");
            prev = idx;
            idx = self.slots[idx].next;
        }
        assert_eq!(self.tail, prev, "tail does not terminate the list");
        assert_eq!(seen.len(), self.map.len(), "map/list bijection violated");
    }

    /// Keys from MRU to LRU, for ordering assertions.
    #[cfg(test)]
    pub(crate) fn recency_order(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut idx = self.head;
        while idx != NIL {
            keys.push(self.slots[idx].key.clone());
            idx = self.slots[idx].next;
        }
        keys
    }
}
