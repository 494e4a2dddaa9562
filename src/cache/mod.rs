//! TTL cache for RPC results.
//!
//! # Responsibilities
//! - Store values under opaque string keys with a per-entry time-to-live
//! - Treat expired entries as absent and evict them lazily on read
//! - Expose invalidation hooks and a point-in-time entry count
//!
//! # Design Decisions
//! - Per-key TTL: derived addresses stay fresh for tens of minutes while
//!   balances go stale within a couple of minutes
//! - Lazy expiry on read instead of a background sweep; memory stays bounded
//!   by the set of distinct keys queried
//! - `tokio::time::Instant` so the paused test clock drives expiry

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;

/// A single cached value with its storage timestamp and lifetime.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// Point-in-time cache snapshot for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently held, expired or not.
    pub entries: usize,
}

/// A thread-safe map from string keys to values with per-entry expiry.
///
/// `get` never blocks on I/O and never fails; `set` is an atomic replacement
/// of the whole entry, so readers never observe a partial write.
#[derive(Debug)]
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    /// Label attached to hit/miss metrics (e.g. "wallet_address").
    tier: &'static str,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache. `tier` names this cache in metrics.
    pub fn new(tier: &'static str) -> Self {
        Self {
            entries: DashMap::new(),
            tier,
        }
    }

    /// Return the stored value if present and unexpired.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                metrics::record_cache_hit(self.tier);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            // Re-check under the entry lock: another writer may have
            // refreshed the key between the read above and this removal.
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
        }
        metrics::record_cache_miss(self.tier);
        None
    }

    /// Store `value` under `key`, overwriting any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
        metrics::record_cache_size(self.tier, self.entries.len());
    }

    /// Remove a single entry. Idempotent.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove all entries. Idempotent.
    pub fn clear(&self) {
        self.entries.clear();
        metrics::record_cache_size(self.tier, 0);
    }

    /// Snapshot of the current entry count.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
        }
    }
}
