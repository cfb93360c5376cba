use std::{collections::VecDeque, sync::Mutex};

use dashmap::DashMap;
use time::Duration;
use tracing::debug;

use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::clock::SharedClock;
use crate::types::CacheEntry;

/// Fingerprint-keyed result store with per-entry TTL and a capacity bound.
///
/// A miss is never an error: absent and expired entries both read as `None`
/// and the caller recomputes. Eviction on capacity pressure removes the
/// oldest-inserted entry first. Process-wide state with no cross-instance
/// coherence; staleness beyond TTL is the only consistency guarantee.
#[derive(Debug)]
pub struct ResultCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    insertion_order: Mutex<VecDeque<String>>,
    capacity: usize,
    clock: SharedClock,
    stats: CacheStats,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(capacity: usize, clock: SharedClock) -> Self {
        Self {
            entries: DashMap::new(),
            insertion_order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            clock,
            stats: CacheStats::new(),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<T> {
        let now = self.clock.now();
        let result = self.entries.get(fingerprint).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        if result.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        result
    }

    pub fn insert(&self, fingerprint: impl Into<String>, value: T, ttl: Duration) {
        let fingerprint = fingerprint.into();
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
            ttl,
        };

        let fresh_key = self.entries.insert(fingerprint.clone(), entry).is_none();
        if fresh_key {
            let evicted = {
                let mut order = lock_order(&self.insertion_order);
                order.push_back(fingerprint);
                if order.len() > self.capacity {
                    order.pop_front()
                } else {
                    None
                }
            };
            if let Some(oldest) = evicted {
                self.entries.remove(&oldest);
                self.stats.record_eviction(1);
                debug!(target: "redraft_cache", fingerprint = %oldest, "evicted oldest entry");
            }
        }
        self.stats.set_entry_count(self.entries.len());
    }

    pub fn clear(&self) {
        self.entries.clear();
        lock_order(&self.insertion_order).clear();
        self.stats.set_entry_count(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn stats_snapshot(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.clock.now())
    }
}

fn lock_order<'a>(order: &'a Mutex<VecDeque<String>>) -> std::sync::MutexGuard<'a, VecDeque<String>> {
    // Insertion bookkeeping never panics while holding the lock.
    match order.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;
    use time::OffsetDateTime;

    fn manual_cache(capacity: usize) -> (ResultCache<i32>, std::sync::Arc<ManualClock>) {
        let clock = ManualClock::starting_at(OffsetDateTime::UNIX_EPOCH);
        let cache = ResultCache::new(capacity, clock.clone());
        (cache, clock)
    }

    #[test]
    fn set_then_get_round_trips() {
        let (cache, _clock) = manual_cache(8);
        cache.insert("fp", 42, Duration::seconds(300));
        assert_eq!(cache.get("fp"), Some(42));
    }

    #[test]
    fn entries_expire_after_ttl_under_simulated_clock() {
        let (cache, clock) = manual_cache(8);
        cache.insert("fp", 42, Duration::seconds(300));

        clock.advance(Duration::seconds(300));
        assert_eq!(cache.get("fp"), Some(42));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("fp"), None);
    }

    #[test]
    fn expired_reads_count_as_misses() {
        let (cache, clock) = manual_cache(8);
        cache.insert("fp", 1, Duration::seconds(10));
        clock.advance(Duration::seconds(11));
        assert_eq!(cache.get("fp"), None);

        let snapshot = cache.stats_snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.misses, 1);
    }

    #[test]
    fn capacity_pressure_evicts_oldest_inserted_first() {
        let (cache, _clock) = manual_cache(2);
        cache.insert("first", 1, Duration::hours(1));
        cache.insert("second", 2, Duration::hours(1));
        cache.insert("third", 3, Duration::hours(1));

        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(2));
        assert_eq!(cache.get("third"), Some(3));
        assert_eq!(cache.stats_snapshot().evictions, 1);
    }

    #[test]
    fn overwriting_a_key_does_not_evict() {
        let (cache, _clock) = manual_cache(2);
        cache.insert("a", 1, Duration::hours(1));
        cache.insert("b", 2, Duration::hours(1));
        cache.insert("a", 10, Duration::hours(1));

        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_resets_entries_but_keeps_traffic_counters() {
        let (cache, _clock) = manual_cache(4);
        cache.insert("a", 1, Duration::hours(1));
        cache.get("a");
        cache.clear();

        let snapshot = cache.stats_snapshot();
        assert_eq!(snapshot.entry_count, 0);
        assert_eq!(snapshot.hits, 1);
        assert!(cache.is_empty());
    }
}
