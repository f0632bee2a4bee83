//! Store statistics
//!
//! Counters maintained by the store, snapshotted for logging and inspection.

/// Point-in-time view of store activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Successful `get` lookups
    pub hits: u64,

    /// Failed `get` lookups (absent or expired)
    pub misses: u64,

    /// Entries removed to make room at capacity
    pub evictions: u64,

    /// Entries removed because their deadline passed
    pub expirations: u64,

    /// Current number of live entries
    pub len: usize,

    /// Configured capacity
    pub max_keys: usize,
}

impl StoreStats {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}
