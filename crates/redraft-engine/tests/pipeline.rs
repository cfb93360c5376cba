//! End-to-end pipeline behavior: tier fan-out, merge priority, caching,
//! quota gating, and generation discipline.

use std::sync::Arc;

use async_trait::async_trait;
use redraft_analyzers::{
    Analyzer, AnalyzerContext, Category, RawFinding, Severity, SourceTier, TierFlags,
};
use redraft_engine::{
    bootstrap, AnalyzeRequest, CycleState, DocNode, Document, EngineSettings, SuggestionEngine,
};

/// Test analyzer that flags every whole-word occurrence of one needle.
struct NeedleAnalyzer {
    tier: SourceTier,
    rule: &'static str,
    needle: &'static str,
    fix: Option<&'static str>,
    confidence: Option<f64>,
    delay: Option<std::time::Duration>,
    fail: bool,
}

impl NeedleAnalyzer {
    fn new(tier: SourceTier, rule: &'static str, needle: &'static str) -> Self {
        Self {
            tier,
            rule,
            needle,
            fix: None,
            confidence: None,
            delay: None,
            fail: false,
        }
    }

    fn with_fix(mut self, fix: &'static str) -> Self {
        self.fix = Some(fix);
        self
    }

    fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Analyzer for NeedleAnalyzer {
    fn id(&self) -> &str {
        self.rule
    }

    fn tier(&self) -> SourceTier {
        self.tier
    }

    async fn run(
        &self,
        text: &str,
        _context: &AnalyzerContext,
    ) -> anyhow::Result<Vec<RawFinding>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("scripted failure");
        }

        let lower = text.to_lowercase();
        let needle = self.needle.to_lowercase();
        let mut findings = Vec::new();
        for (start, _) in lower.match_indices(&needle) {
            let end = start + needle.len();
            let boundary_ok = (start == 0
                || !text[..start].chars().next_back().is_some_and(char::is_alphanumeric))
                && (end == text.len()
                    || !text[end..].chars().next().is_some_and(char::is_alphanumeric));
            if !boundary_ok {
                continue;
            }
            let mut finding = RawFinding::new(
                self.rule,
                Category::Clarity,
                Severity::Hint,
                &text[start..end],
                start,
                end,
                format!("flagged \"{}\"", self.needle),
            );
            if let Some(fix) = self.fix {
                finding = finding.with_fix(fix);
            }
            if let Some(confidence) = self.confidence {
                finding = finding.with_confidence(confidence);
            }
            findings.push(finding);
        }
        Ok(findings)
    }
}

fn paragraph_doc(text: &str) -> Document {
    Document::new(DocNode::container(
        "doc",
        vec![DocNode::container("paragraph", vec![DocNode::leaf(text)])],
    ))
}

fn request(text: &str, tiers: TierFlags) -> AnalyzeRequest {
    let mut request = AnalyzeRequest::new(paragraph_doc(text));
    request.tiers = tiers;
    request
}

fn fast_only() -> TierFlags {
    TierFlags {
        enable_fast: true,
        enable_deep: false,
        enable_seo: false,
        enable_ai: false,
    }
}

#[tokio::test]
async fn scenario_misspelling_produces_spelling_suggestion_with_fix() {
    let engine = SuggestionEngine::new(bootstrap(EngineSettings::default()));
    let cycle = engine
        .analyze(request("Teh cat sat.", fast_only()))
        .await
        .expect("analysis starts");

    let suggestions = cycle.settled().await;
    let teh = suggestions
        .iter()
        .find(|s| s.match_text == "Teh")
        .expect("Teh is flagged");
    assert_eq!(teh.category, Category::Spelling);
    assert_eq!(teh.primary_fix(), Some("The"));
    assert_eq!(teh.plain_start, 0);
}

#[tokio::test]
async fn repeated_short_matches_get_sequential_occurrence_ids() {
    let context = bootstrap(EngineSettings::default());
    context
        .analyzers
        .insert(Arc::new(NeedleAnalyzer::new(
            SourceTier::Deep,
            "overused-it",
            "it",
        )))
        .await;
    let engine = SuggestionEngine::new(context);

    let mut tiers = fast_only();
    tiers.enable_fast = false;
    tiers.enable_deep = true;
    let cycle = engine
        .analyze(request("It is raining. Take it with you.", tiers))
        .await
        .expect("analysis starts");

    let suggestions = cycle.settled().await;
    let ids: Vec<&str> = suggestions
        .iter()
        .filter(|s| s.sub_category == "overused-it")
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(ids, vec!["overused-it-it-0", "overused-it-it-1"]);
}

#[tokio::test]
async fn quota_refusal_skips_ai_without_error() {
    let settings = EngineSettings {
        ai_daily_limit: 0,
        ..EngineSettings::default()
    };
    let context = bootstrap(settings);
    context
        .analyzers
        .insert(Arc::new(
            NeedleAnalyzer::new(SourceTier::AiEnhance, "tone-rewrite", "cat")
                .with_fix("feline")
                .with_confidence(0.95),
        ))
        .await;
    let engine = SuggestionEngine::new(context);

    let mut tiers = fast_only();
    tiers.enable_ai = true;
    let mut req = request("Teh cat sat.", tiers);
    req.user_id = Some("writer-1".to_string());

    let cycle = engine.analyze(req).await.expect("quota refusal is not an error");
    let suggestions = cycle.settled().await;

    assert!(!suggestions.is_empty(), "fast findings must survive");
    assert!(suggestions.iter().all(|s| !s.ai_enhanced));
    let (_, state) = engine.cycle_state().await;
    assert_eq!(state, CycleState::Settled);
}

#[tokio::test]
async fn enhanced_fix_wins_collision_and_keeps_fast_fix_as_secondary() {
    let context = bootstrap(EngineSettings::default());
    // Same rule id and matched text as the fast misspelling finding, so the
    // stable ids collide.
    context
        .analyzers
        .insert(Arc::new(
            NeedleAnalyzer::new(SourceTier::AiEnhance, "misspelling-teh", "teh")
                .with_fix("The gray")
                .with_confidence(0.9),
        ))
        .await;
    let engine = SuggestionEngine::new(context);

    let mut tiers = fast_only();
    tiers.enable_ai = true;
    let mut req = request("Teh cat sat.", tiers);
    req.user_id = Some("writer-1".to_string());

    let suggestions = engine.analyze(req).await.expect("analysis starts").settled().await;
    let merged = suggestions
        .iter()
        .find(|s| s.sub_category == "misspelling-teh")
        .expect("collision survives merge");

    assert!(merged.ai_enhanced);
    assert_eq!(merged.primary_fix(), Some("The gray"));
    let fix_values: Vec<&str> = merged
        .actions
        .iter()
        .filter_map(|a| a.value.as_deref())
        .collect();
    assert!(fix_values.contains(&"The"), "fast fix kept as secondary: {fix_values:?}");
}

#[tokio::test]
async fn low_confidence_ai_findings_are_filtered() {
    let context = bootstrap(EngineSettings::default());
    context
        .analyzers
        .insert(Arc::new(
            NeedleAnalyzer::new(SourceTier::AiDetect, "weak-guess", "cat")
                .with_confidence(0.3),
        ))
        .await;
    let engine = SuggestionEngine::new(context);

    let mut tiers = fast_only();
    tiers.enable_ai = true;
    let mut req = request("Teh cat sat.", tiers);
    req.user_id = Some("writer-1".to_string());

    let suggestions = engine.analyze(req).await.expect("analysis starts").settled().await;
    assert!(suggestions.iter().all(|s| s.sub_category != "weak-guess"));
}

#[tokio::test]
async fn unchanged_document_is_idempotent_and_cache_served() {
    let engine = SuggestionEngine::new(bootstrap(EngineSettings::default()));
    let tiers = TierFlags {
        enable_fast: true,
        enable_deep: true,
        enable_seo: false,
        enable_ai: false,
    };
    let text = "We should utilize the new pipeline. Teh cat sat.";

    let first = engine
        .analyze(request(text, tiers))
        .await
        .expect("first run starts")
        .settled()
        .await;
    let second = engine
        .analyze(request(text, tiers))
        .await
        .expect("second run starts")
        .settled()
        .await;

    assert_eq!(first, second, "ids and order must be stable across passes");
    let stats = engine.context().cache_stats();
    assert!(stats.hits >= 1, "deep tier should be served from cache: {stats:?}");
}

#[tokio::test]
async fn adapter_failure_degrades_without_aborting_cycle() {
    let context = bootstrap(EngineSettings::default());
    context
        .analyzers
        .insert(Arc::new(
            NeedleAnalyzer::new(SourceTier::Deep, "broken", "cat").failing(),
        ))
        .await;
    let engine = SuggestionEngine::new(context);

    let tiers = TierFlags {
        enable_fast: true,
        enable_deep: true,
        enable_seo: false,
        enable_ai: false,
    };
    let suggestions = engine
        .analyze(request("Teh cat sat.", tiers))
        .await
        .expect("analysis starts")
        .settled()
        .await;

    assert!(suggestions.iter().any(|s| s.sub_category == "misspelling-teh"));
    let (_, state) = engine.cycle_state().await;
    assert_eq!(state, CycleState::Settled);
}

#[tokio::test]
async fn newer_cycle_supersedes_slow_older_cycle() {
    let context = bootstrap(EngineSettings::default());
    context
        .analyzers
        .insert(Arc::new(
            NeedleAnalyzer::new(SourceTier::Deep, "slow-needle", "zap")
                .with_delay(std::time::Duration::from_millis(80)),
        ))
        .await;
    let engine = SuggestionEngine::new(context.clone());

    let mut tiers = fast_only();
    tiers.enable_fast = false;
    tiers.enable_deep = true;

    let stale_cycle = engine
        .analyze(request("zap appears here", tiers))
        .await
        .expect("first cycle starts");
    let fresh_cycle = engine
        .analyze(request("nothing to flag here", tiers))
        .await
        .expect("second cycle starts");
    let fresh_generation = fresh_cycle.generation;

    let _ = stale_cycle.settled().await;
    let suggestions = fresh_cycle.settled().await;

    assert!(
        suggestions.iter().all(|s| s.sub_category != "slow-needle"),
        "stale cycle's findings must not leak into the new cycle"
    );
    assert!(context.stale_drops() >= 1);
    let (generation, state) = engine.cycle_state().await;
    assert_eq!(generation, fresh_generation);
    assert_eq!(state, CycleState::Settled);
}
