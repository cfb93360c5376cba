use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
};

use redraft_analyzers::{
    AnalyzerRegistry, CacheStatsSnapshot, RawFinding, ResultCache, SourceTier, UsageLimiter,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::suggestion::Suggestion;
use crate::EngineSettings;

/// Lifecycle of one analysis cycle. Fast publication always precedes the
/// slow tiers; `Settled` means every expected source has resolved (or been
/// skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleState {
    Idle,
    FastRunning,
    FastReady,
    DeepRunning,
    EnhancedReady,
    Settled,
}

/// The published output of the most recent analysis cycle: per-source
/// suggestion lists plus the merged view consumers read.
#[derive(Debug)]
pub struct PublishedCycle {
    pub generation: u64,
    pub state: CycleState,
    pub sources: HashMap<SourceTier, Vec<Suggestion>>,
    pub expected: HashSet<SourceTier>,
    pub arrived: HashSet<SourceTier>,
    pub suggestions: Vec<Suggestion>,
}

impl PublishedCycle {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            state: CycleState::Idle,
            sources: HashMap::new(),
            expected: HashSet::new(),
            arrived: HashSet::new(),
            suggestions: Vec::new(),
        }
    }
}

/// Process-wide engine state, constructed once by
/// [`crate::bootstrap`] and shared by `Arc`. The cache and the usage
/// limiter are keyed stores; concurrent traffic on different keys does not
/// contend.
pub struct EngineContext {
    pub settings: EngineSettings,
    pub analyzers: AnalyzerRegistry,
    pub cache: Arc<ResultCache<Vec<RawFinding>>>,
    pub usage: Arc<UsageLimiter>,
    pub published: RwLock<PublishedCycle>,
    generation: AtomicU64,
    stale_drops: AtomicU64,
}

impl EngineContext {
    pub fn new(
        settings: EngineSettings,
        analyzers: AnalyzerRegistry,
        cache: Arc<ResultCache<Vec<RawFinding>>>,
        usage: Arc<UsageLimiter>,
    ) -> Self {
        Self {
            settings,
            analyzers,
            cache,
            usage,
            published: RwLock::new(PublishedCycle::empty()),
            generation: AtomicU64::new(0),
            stale_drops: AtomicU64::new(0),
        }
    }

    /// Allocate the next cycle generation. Monotonic; a stale cycle can
    /// never observe or overwrite a newer cycle's published state.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn record_stale_drop(&self) {
        self.stale_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_drops(&self) -> u64 {
        self.stale_drops.load(Ordering::Relaxed)
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_monotonic() {
        let context = crate::bootstrap(EngineSettings::default());
        let first = context.next_generation();
        let second = context.next_generation();
        assert!(second > first);
        assert_eq!(context.current_generation(), second);
    }
}
