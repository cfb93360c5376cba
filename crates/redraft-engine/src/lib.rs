//! The suggestion engine core: position mapping over the document tree,
//! stable suggestion identity, merge & reconciliation across racing
//! analyzer sources, and transactional fix application.
//!
//! The engine reads a document snapshot, fans out to the analyzer tiers
//! registered in [`EngineContext`], and republishes a merged suggestion
//! list every time a source resolves. Everything around it — transports,
//! storage, rendering — is expected to be a thin wrapper over this crate.

use std::sync::Arc;

pub mod document;
pub mod engine;
pub mod fixer;
pub mod identity;
pub mod merge;
pub mod position;
pub mod state;
pub mod suggestion;

use redraft_analyzers::{
    system_clock, AiClient, AiClientConfig, AiDetectAnalyzer, AiEnhanceAnalyzer, AnalyzerRegistry,
    DeepAnalyzer, FastAnalyzer, ResultCache, SeoAnalyzer, SharedAnalyzer, SharedClock,
    UsageLimiter,
};
use tracing::debug;

pub use document::{DocNode, Document};
pub use engine::{AnalysisCycle, AnalyzeRequest, EngineError, SuggestionEngine};
pub use fixer::{apply, AppliedFix, FixError};
pub use position::{OffsetIndex, SpanKind, TreePos};
pub use state::{CycleState, EngineContext, PublishedCycle};
pub use suggestion::{Action, ActionType, Suggestion};

/// Process-level engine configuration. Defaults follow the recommended
/// operating point: volatile results cached briefly, expensive results for
/// an hour, AI findings gated at 0.7 confidence.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub cache_capacity: usize,
    pub volatile_cache_ttl: time::Duration,
    pub stable_cache_ttl: time::Duration,
    pub ai_confidence_threshold: f64,
    pub ai_daily_limit: u32,
    pub ai: AiClientConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_capacity: 512,
            volatile_cache_ttl: time::Duration::minutes(5),
            stable_cache_ttl: time::Duration::hours(1),
            ai_confidence_threshold: 0.7,
            ai_daily_limit: 50,
            ai: AiClientConfig::default(),
        }
    }
}

/// Build the process-wide engine context with the default analyzer set.
pub fn bootstrap(settings: EngineSettings) -> Arc<EngineContext> {
    bootstrap_with_clock(settings, system_clock())
}

/// As [`bootstrap`], with an injected clock for deterministic tests.
pub fn bootstrap_with_clock(settings: EngineSettings, clock: SharedClock) -> Arc<EngineContext> {
    let ai_client = Arc::new(AiClient::new(settings.ai.clone()));
    let analyzers: Vec<SharedAnalyzer> = vec![
        Arc::new(FastAnalyzer::new()),
        Arc::new(DeepAnalyzer::with_ttl(settings.stable_cache_ttl)),
        Arc::new(SeoAnalyzer::with_ttl(settings.stable_cache_ttl)),
        Arc::new(AiDetectAnalyzer::new(ai_client.clone())),
        Arc::new(AiEnhanceAnalyzer::new(ai_client)),
    ];
    let registry = AnalyzerRegistry::with_analyzers(analyzers);
    let cache = Arc::new(ResultCache::new(settings.cache_capacity, clock.clone()));
    let usage = Arc::new(UsageLimiter::new(settings.ai_daily_limit, clock));

    debug!(
        target: "redraft_engine",
        cache_capacity = settings.cache_capacity,
        ai_configured = settings.ai.endpoint.is_some(),
        "engine context initialized"
    );

    Arc::new(EngineContext::new(settings, registry, cache, usage))
}
