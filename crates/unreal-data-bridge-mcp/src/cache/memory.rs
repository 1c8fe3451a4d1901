//! In-memory response cache with TTL support

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use super::key::CacheKey;

/// Cache entry with value and monotonic expiration
struct CacheEntry {
    value: Map<String, Value>,
    expires_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.ttl.is_zero() || now > self.expires_at
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
}

/// Cache hit/miss statistics, computed on read
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)` rounded to two decimals, `0.0` before any lookup
    pub hit_rate: f64,
    pub entries: usize,
}

/// Which entries an invalidation removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Drop every entry
    All,
    /// Drop entries whose key starts with this string (plain prefix, not a glob)
    Prefix(String),
}

impl Invalidation {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }
}

impl From<Option<&str>> for Invalidation {
    fn from(prefix: Option<&str>) -> Self {
        prefix.map_or(Self::All, Self::prefix)
    }
}

/// TTL-bounded response cache.
///
/// Expiry uses the monotonic tokio clock and is checked lazily on `get`;
/// there is no background sweep. The cache is not internally synchronized:
/// its owner serializes access (see `ConnectionManager`).
#[derive(Default)]
pub struct ResponseCache {
    store: HashMap<CacheKey, CacheEntry>,
    counters: Counters,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entry_count", &self.store.len())
            .field("hits", &self.counters.hits)
            .field("misses", &self.counters.misses)
            .finish()
    }
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached value if it exists and hasn't expired
    pub fn get(&mut self, key: &CacheKey) -> Option<Map<String, Value>> {
        let now = Instant::now();

        let expired = match self.store.get(key) {
            None => {
                self.counters.misses += 1;
                tracing::debug!(cache.result = "miss", cache.key = %key);
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.store.remove(key);
            self.counters.misses += 1;
            tracing::debug!(cache.result = "expired", cache.key = %key);
            return None;
        }

        self.counters.hits += 1;
        tracing::debug!(cache.result = "hit", cache.key = %key);
        self.store.get(key).map(|entry| entry.value.clone())
    }

    /// Store a value; a zero TTL yields an entry that misses on the next `get`
    pub fn set(&mut self, key: CacheKey, value: Map<String, Value>, ttl: Duration) {
        tracing::debug!(
            cache.operation = "set",
            cache.key = %key,
            cache.ttl_secs = ttl.as_secs(),
        );

        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
            ttl,
        };
        self.store.insert(key, entry);
    }

    /// Remove matching entries, returning how many were dropped
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> usize {
        match invalidation {
            Invalidation::All => {
                let count = self.store.len();
                self.store.clear();
                tracing::debug!(cache.operation = "clear", cache.removed = count);
                count
            }
            Invalidation::Prefix(prefix) => {
                let before = self.store.len();
                self.store.retain(|key, _| !key.starts_with(prefix));
                let removed = before - self.store.len();
                tracing::debug!(
                    cache.operation = "invalidate",
                    cache.prefix = %prefix,
                    cache.removed = removed,
                );
                removed
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let Counters { hits, misses } = self.counters;
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            ((hits as f64 / total as f64) * 100.0).round() / 100.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: self.store.len(),
        }
    }

    /// Zero the hit/miss counters without touching stored entries
    pub fn reset_stats(&mut self) {
        self.counters = Counters::default();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
