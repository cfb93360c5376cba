use std::sync::Arc;

use redraft_analyzers::{
    fingerprint, AnalyzerContext, DocumentMeta, RawFinding, SharedAnalyzer, SourceTier, TierFlags,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::merge::merge_sources;
use crate::position::OffsetIndex;
use crate::state::{CycleState, EngineContext, PublishedCycle};
use crate::suggestion::Suggestion;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One analysis request against a document snapshot.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub document: Document,
    pub meta: DocumentMeta,
    pub tiers: TierFlags,
    /// Minimum confidence an AI finding needs to reach the merged list.
    pub ai_confidence_threshold: Option<f64>,
    /// Required for the AI tiers; without it they are skipped.
    pub user_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            meta: DocumentMeta::default(),
            tiers: TierFlags::default(),
            ai_confidence_threshold: None,
            user_id: None,
        }
    }
}

/// Handle to an in-flight cycle: the fast results are available
/// immediately, the slow tiers settle in the background.
pub struct AnalysisCycle {
    pub generation: u64,
    pub fast: Vec<Suggestion>,
    tasks: Vec<JoinHandle<()>>,
    context: Arc<EngineContext>,
}

impl std::fmt::Debug for AnalysisCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCycle")
            .field("generation", &self.generation)
            .field("fast", &self.fast)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl AnalysisCycle {
    /// Await every slow tier of this cycle and return the merged list. If a
    /// newer cycle superseded this one while waiting, returns the newer
    /// cycle's published list — the stale one no longer exists.
    pub async fn settled(self) -> Vec<Suggestion> {
        for result in futures::future::join_all(self.tasks).await {
            if let Err(error) = result {
                warn!(target: "redraft_engine", error = %error, "analysis task aborted");
            }
        }
        self.context.published.read().await.suggestions.clone()
    }
}

/// The merge & reconciliation orchestrator.
///
/// Fans out to analyzer adapters — synchronously for the fast tier,
/// spawned tasks for the rest — and republishes the merged list whenever
/// any source resolves. Results arriving for a superseded generation are
/// dropped at publish time; in-flight work is never forcibly aborted.
#[derive(Clone)]
pub struct SuggestionEngine {
    context: Arc<EngineContext>,
}

impl SuggestionEngine {
    pub fn new(context: Arc<EngineContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> Arc<EngineContext> {
        self.context.clone()
    }

    /// Start a new analysis cycle. Validates input before any analyzer
    /// runs, publishes the fast tier's suggestions before returning, and
    /// leaves the slow tiers settling in the background.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalysisCycle, EngineError> {
        validate(&request)?;

        let generation = self.context.next_generation();
        let index = OffsetIndex::build(&request.document);
        let text = Arc::new(index.into_plain_text());
        let analyzer_context = Arc::new(AnalyzerContext {
            meta: request.meta.clone(),
            tiers: request.tiers,
        });

        let threshold = request
            .ai_confidence_threshold
            .unwrap_or(self.context.settings.ai_confidence_threshold);

        let mut expected = Vec::new();
        if request.tiers.enable_fast {
            expected.push(SourceTier::Fast);
        }
        if request.tiers.enable_deep {
            expected.push(SourceTier::Deep);
        }
        if request.tiers.enable_seo {
            expected.push(SourceTier::Seo);
        }
        let ai_allowed = request.tiers.enable_ai && self.ai_budget_ok(request.user_id.as_deref());
        if ai_allowed {
            expected.push(SourceTier::AiDetect);
            expected.push(SourceTier::AiEnhance);
        }

        {
            let mut published = self.context.published.write().await;
            *published = PublishedCycle::empty();
            published.generation = generation;
            published.state = CycleState::FastRunning;
            published.expected = expected.iter().copied().collect();
        }
        info!(
            target: "redraft_engine",
            generation,
            tiers = expected.len(),
            chars = text.len(),
            "analysis cycle started"
        );

        // Fast tier runs inline so the caller never waits on slow sources.
        if request.tiers.enable_fast {
            let findings = self.run_tier(SourceTier::Fast, &text, &analyzer_context).await;
            let suggestions = to_suggestions(findings, SourceTier::Fast, &text, threshold);
            publish(&self.context, generation, SourceTier::Fast, suggestions).await;
        }

        let mut tasks = Vec::new();
        for tier in expected {
            if tier == SourceTier::Fast {
                continue;
            }
            let engine = self.clone();
            let text = text.clone();
            let analyzer_context = analyzer_context.clone();
            let user_id = request.user_id.clone();
            tasks.push(tokio::spawn(async move {
                let findings = engine.run_tier(tier, &text, &analyzer_context).await;
                if tier.is_ai() && !findings.is_empty() {
                    if let Some(user_id) = user_id.as_deref() {
                        engine.context.usage.track_ai_usage(user_id, 1);
                    }
                }
                let suggestions = to_suggestions(findings, tier, &text, threshold);
                publish(&engine.context, generation, tier, suggestions).await;
            }));
        }

        let fast = self.context.published.read().await.suggestions.clone();
        Ok(AnalysisCycle {
            generation,
            fast,
            tasks,
            context: self.context.clone(),
        })
    }

    /// The merged list as of the most recent publication.
    pub async fn current_suggestions(&self) -> Vec<Suggestion> {
        self.context.published.read().await.suggestions.clone()
    }

    pub async fn cycle_state(&self) -> (u64, CycleState) {
        let published = self.context.published.read().await;
        (published.generation, published.state)
    }

    fn ai_budget_ok(&self, user_id: Option<&str>) -> bool {
        match user_id {
            None => false,
            Some(user_id) => {
                let allowed = self.context.usage.check_ai_usage(user_id);
                if !allowed {
                    debug!(target: "redraft_engine", user_id, "AI tiers skipped: quota exhausted");
                }
                allowed
            }
        }
    }

    /// Run one tier through its cache gate. Adapter errors degrade to an
    /// empty finding set for that source and never abort the cycle.
    async fn run_tier(
        &self,
        tier: SourceTier,
        text: &str,
        analyzer_context: &AnalyzerContext,
    ) -> Vec<RawFinding> {
        let Some(analyzer) = self.context.analyzers.get(tier).await else {
            debug!(target: "redraft_engine", tier = tier.name(), "no analyzer registered");
            return Vec::new();
        };
        self.run_analyzer(&analyzer, text, analyzer_context).await
    }

    async fn run_analyzer(
        &self,
        analyzer: &SharedAnalyzer,
        text: &str,
        analyzer_context: &AnalyzerContext,
    ) -> Vec<RawFinding> {
        let cache_key = analyzer.cache_ttl().map(|ttl| {
            (fingerprint(analyzer.id(), text, analyzer_context), ttl)
        });

        if let Some((key, _)) = &cache_key {
            if let Some(cached) = self.context.cache.get(key) {
                debug!(
                    target: "redraft_engine",
                    analyzer = analyzer.id(),
                    "served from result cache"
                );
                return cached;
            }
        }

        let findings = match analyzer.run(text, analyzer_context).await {
            Ok(findings) => findings,
            Err(error) => {
                warn!(
                    target: "redraft_engine",
                    analyzer = analyzer.id(),
                    error = %error,
                    "adapter failed; degrading to empty result"
                );
                return Vec::new();
            }
        };

        if let Some((key, ttl)) = cache_key {
            self.context.cache.insert(key, findings.clone(), ttl);
        }
        findings
    }
}

fn validate(request: &AnalyzeRequest) -> Result<(), EngineError> {
    if request.document.root.is_leaf() {
        return Err(EngineError::InvalidRequest(
            "document root must be a container node".to_string(),
        ));
    }
    if request.document.root.children().is_empty() {
        return Err(EngineError::InvalidRequest(
            "document has no content".to_string(),
        ));
    }
    let meta = &request.meta;
    let meta_missing =
        meta.title.is_none() && meta.target_keyword.is_none() && meta.meta_description.is_none();
    if request.tiers.enable_seo && meta_missing {
        return Err(EngineError::InvalidRequest(
            "SEO tier enabled but no document metadata supplied".to_string(),
        ));
    }
    Ok(())
}

/// Convert raw findings to suggestions, applying the AI confidence floor.
fn to_suggestions(
    findings: Vec<RawFinding>,
    tier: SourceTier,
    text: &str,
    threshold: f64,
) -> Vec<Suggestion> {
    findings
        .into_iter()
        .filter(|finding| {
            if !tier.is_ai() {
                return true;
            }
            finding
                .confidence
                .map_or(true, |confidence| confidence >= threshold)
        })
        .map(|finding| Suggestion::from_finding(&finding, tier, text))
        .collect()
}

/// Apply one source's results to the published cycle, unless the cycle has
/// been superseded — stale generations are silently dropped.
async fn publish(
    context: &Arc<EngineContext>,
    generation: u64,
    tier: SourceTier,
    suggestions: Vec<Suggestion>,
) {
    let mut published = context.published.write().await;
    if published.generation != generation {
        context.record_stale_drop();
        debug!(
            target: "redraft_engine",
            stale = generation,
            current = published.generation,
            tier = tier.name(),
            "dropping stale cycle result"
        );
        return;
    }

    published.arrived.insert(tier);
    published.sources.insert(tier, suggestions);
    published.suggestions = merge_sources(&published.sources);
    let state = next_state(&published, tier);
    published.state = state;

    info!(
        target: "redraft_engine",
        generation,
        tier = tier.name(),
        total = published.suggestions.len(),
        state = ?published.state,
        "published partial results"
    );
}

fn next_state(published: &PublishedCycle, arrived_tier: SourceTier) -> CycleState {
    if published.arrived.is_superset(&published.expected) {
        return CycleState::Settled;
    }
    match arrived_tier {
        SourceTier::Fast => CycleState::FastReady,
        SourceTier::AiEnhance => CycleState::EnhancedReady,
        _ => CycleState::DeepRunning,
    }
}
