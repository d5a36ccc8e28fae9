//! Time-bounded caches.
//!
//! A [`TtlCache`] is owned by the component that uses it (role resolver,
//! geocoder) and is handed its [`CachePolicy`] and [`Clock`] explicitly, so
//! lifetime and invalidation are visible and testable in isolation.
//!
//! Expiry is evaluated lazily on read, and stale entries are swept on insert;
//! nothing runs in the background.
//!
//! # Thread Safety
//!
//! Entries sit behind an `RwLock`. A poisoned lock is treated as an empty
//! cache on read and ignored on write.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// How long an entry stays valid after it was fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time to live, in milliseconds.
    pub ttl_ms: i64,
}

impl CachePolicy {
    /// Policy with the given time to live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Policy expressed in whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// An entry fetched at `fetched_at` is fresh strictly before
    /// `fetched_at + ttl`.
    pub fn is_fresh(&self, fetched_at: i64, now: i64) -> bool {
        now.saturating_sub(fetched_at) < self.ttl_ms
    }
}

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    fetched_at: i64,
}

/// Keyed cache whose entries expire after a fixed duration.
pub struct TtlCache<K, V> {
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a fresh value, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| self.policy.is_fresh(entry.fetched_at, now))
            .map(|entry| entry.value.clone())
    }

    /// Store a value stamped with the current time, dropping expired entries.
    pub fn insert(&self, key: K, value: V) {
        let fetched_at = self.clock.now_millis();
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| self.policy.is_fresh(entry.fetched_at, fetched_at));
            entries.insert(key, CacheEntry { value, fetched_at });
        }
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_entry_expires_at_ttl() {
        let clock = ManualClock::shared(0);
        let cache: TtlCache<&str, u32> = TtlCache::new(CachePolicy::from_secs(300), clock.clone());

        cache.insert("roles", 3);
        clock.advance(299_999);
        assert_eq!(cache.get(&"roles"), Some(3));

        clock.advance(1);
        assert_eq!(cache.get(&"roles"), None);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let clock = ManualClock::shared(0);
        let cache: TtlCache<u8, &str> = TtlCache::new(CachePolicy::from_secs(60), clock);

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("b"));

        cache.clear();
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn test_insert_drops_expired_entries() {
        let clock = ManualClock::shared(0);
        let cache: TtlCache<u8, u8> = TtlCache::new(CachePolicy::from_secs(10), clock.clone());

        cache.insert(1, 1);
        clock.advance(5_000);
        cache.insert(2, 2);
        clock.advance(6_000);
        cache.insert(3, 3);

        let mut keys: Vec<u8> = cache.entries.read().unwrap().keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3]);
        assert_eq!(cache.get(&2), Some(2));
    }
}
