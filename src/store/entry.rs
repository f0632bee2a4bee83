//! Store entry definitions
//!
//! An entry carries its value and an absolute expiration deadline on the
//! monotonic clock. A TTL of zero means the entry never expires.

use std::time::{Duration, Instant};

/// A single stored value with its expiration deadline
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: String,

    /// Absolute deadline; `None` means no expiration
    pub deadline: Option<Instant>,
}

impl Entry {
    /// Create an entry expiring `ttl_secs` from now (0 = never)
    pub fn new(value: impl Into<String>, ttl_secs: u32) -> Self {
        Self {
            value: value.into(),
            deadline: Self::deadline_after(ttl_secs),
        }
    }

    /// Compute the deadline for a TTL in seconds (0 = never)
    pub fn deadline_after(ttl_secs: u32) -> Option<Instant> {
        (ttl_secs > 0).then(|| Instant::now() + Duration::from_secs(u64::from(ttl_secs)))
    }

    /// An entry is expired once the current instant reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
