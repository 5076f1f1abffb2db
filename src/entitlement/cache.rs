//! LRU cache of settled entitlements.
//!
//! Holds (account, content) pairs whose payment the settlement layer
//! has already confirmed, so popular content does not cost a contract
//! read per render.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 100_000;

/// Counters describing how the cache is performing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that fell through to slower sources.
    pub misses: u64,
    /// Pairs recorded as settled.
    pub inserts: u64,
}

impl CacheStats {
    /// Total lookups served.
    #[must_use]
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups answered from the cache, in `0.0..=1.0`.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

struct Inner {
    entries: LruCache<(String, String), ()>,
    stats: CacheStats,
}

/// Shared LRU cache of settled (account, content) pairs.
///
/// Entries only enter the cache after confirmed settlement, so a hit is
/// as trustworthy as the chain read it replaces. Eviction merely costs
/// the next check a trip to the authoritative sources.
#[derive(Clone)]
pub struct EntitlementCache {
    inner: Arc<Mutex<Inner>>,
}

impl EntitlementCache {
    /// Create a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` pairs. A zero capacity
    /// is clamped to one entry.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(cap),
                stats: CacheStats::default(),
            })),
        }
    }

    /// Whether this (account, content) pair is cached as settled. Also
    /// refreshes the pair's recency on a hit.
    pub fn contains(&self, user_id: &str, post_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let hit = inner
            .entries
            .get(&(user_id.to_string(), post_id.to_string()))
            .is_some();
        if hit {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        hit
    }

    /// Record a pair as settled. Call only after confirmation.
    pub fn insert(&self, user_id: &str, post_id: &str) {
        let mut inner = self.inner.lock();
        inner
            .entries
            .put((user_id.to_string(), post_id.to_string()), ());
        inner.stats.inserts += 1;
    }

    /// Drop a cached pair, forcing the next check back to the
    /// authoritative sources.
    pub fn invalidate(&self, user_id: &str, post_id: &str) {
        self.inner
            .lock()
            .entries
            .pop(&(user_id.to_string(), post_id.to_string()));
    }

    /// Snapshot of the performance counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Number of cached pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached pair. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

impl Default for EntitlementCache {
    fn default() -> Self {
        Self::new()
    }
}
