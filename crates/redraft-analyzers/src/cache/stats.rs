use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;

/// Cache statistics tracker using atomic counters for thread-safe operation.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of successful cache lookups
    pub hits: AtomicUsize,
    /// Number of failed cache lookups (absent or expired)
    pub misses: AtomicUsize,
    /// Current number of entries in cache
    pub entry_count: AtomicUsize,
    /// Number of cache evictions performed
    pub evictions: AtomicUsize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_entry_count(&self, count: usize) {
        self.entry_count.store(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eviction(&self, count: usize) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics, stamped with the observation
    /// time for operational monitoring.
    pub fn snapshot(&self, now: OffsetDateTime) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entry_count.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            timestamp: now,
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.entry_count.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Immutable snapshot of cache statistics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: usize,
    pub misses: usize,
    pub entry_count: usize,
    pub evictions: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl CacheStatsSnapshot {
    /// Cache hit rate as a percentage (0.0 - 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        (self.hits as f64 / total as f64) * 100.0
    }

    pub fn total_requests(&self) -> usize {
        self.hits + self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_over_mixed_traffic() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        let snapshot = stats.snapshot(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(snapshot.total_requests(), 3);
        assert!((snapshot.hit_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn empty_stats_report_zero_hit_rate() {
        let stats = CacheStats::new();
        let snapshot = stats.snapshot(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(snapshot.hit_rate(), 0.0);
    }
}
