use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::types::{AnalyzerContext, RawFinding};

/// Which source produced a finding. Also fixes the merge priority ladder:
/// an AI-enhanced fix beats deep/SEO, which beat fast/local, which beat
/// AI-detected observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTier {
    Fast,
    Deep,
    Seo,
    AiDetect,
    AiEnhance,
}

impl SourceTier {
    pub fn merge_priority(self) -> u8 {
        match self {
            SourceTier::AiEnhance => 3,
            SourceTier::Deep | SourceTier::Seo => 2,
            SourceTier::Fast => 1,
            SourceTier::AiDetect => 0,
        }
    }

    pub fn is_ai(self) -> bool {
        matches!(self, SourceTier::AiDetect | SourceTier::AiEnhance)
    }

    /// Fast runs inline on the debounce tick; everything else is spawned.
    pub fn is_synchronous(self) -> bool {
        matches!(self, SourceTier::Fast)
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceTier::Fast => "fast",
            SourceTier::Deep => "deep",
            SourceTier::Seo => "seo",
            SourceTier::AiDetect => "ai-detect",
            SourceTier::AiEnhance => "ai-enhance",
        }
    }
}

/// Uniform adapter contract across fast, deep, SEO and AI sources.
///
/// Implementations must be pure with respect to `(text, context)`: identical
/// inputs produce identical findings, which is what makes the result cache
/// sound. Offsets in returned findings refer to `text`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn id(&self) -> &str;

    fn tier(&self) -> SourceTier;

    /// TTL for cached results, or `None` to bypass the cache entirely.
    fn cache_ttl(&self) -> Option<time::Duration> {
        None
    }

    async fn run(&self, text: &str, context: &AnalyzerContext)
        -> anyhow::Result<Vec<RawFinding>>;
}

pub type SharedAnalyzer = Arc<dyn Analyzer>;

/// Tier-keyed analyzer lookup. Call sites dispatch through the registry
/// rather than naming adapter types, so alternative implementations (or test
/// stubs) can be slotted in per tier.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    inner: Arc<RwLock<HashMap<SourceTier, SharedAnalyzer>>>,
}

impl AnalyzerRegistry {
    /// Build a registry synchronously, for process bootstrap before a
    /// runtime is necessarily running.
    pub fn with_analyzers(analyzers: impl IntoIterator<Item = SharedAnalyzer>) -> Self {
        let map: HashMap<SourceTier, SharedAnalyzer> = analyzers
            .into_iter()
            .map(|analyzer| (analyzer.tier(), analyzer))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, analyzer: SharedAnalyzer) {
        self.inner.write().await.insert(analyzer.tier(), analyzer);
    }

    pub async fn get(&self, tier: SourceTier) -> Option<SharedAnalyzer> {
        self.inner.read().await.get(&tier).cloned()
    }

    pub async fn tiers(&self) -> Vec<SourceTier> {
        self.inner.read().await.keys().copied().collect()
    }
}
