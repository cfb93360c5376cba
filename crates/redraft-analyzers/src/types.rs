use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Broad grouping used to order suggestions for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spelling,
    Grammar,
    Style,
    Readability,
    Seo,
    Clarity,
}

impl Category {
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Spelling => "Spelling",
            Category::Grammar => "Grammar",
            Category::Style => "Style",
            Category::Readability => "Readability",
            Category::Seo => "SEO",
            Category::Clarity => "Clarity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Warning,
    Error,
}

/// A single analyzer hit against the plain-text projection. Ephemeral:
/// produced fresh per analyzer invocation or replayed from the result cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFinding {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub matched_text: String,
    pub plain_start: usize,
    pub plain_end: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_text: Option<String>,
    /// Present only on AI-sourced findings, in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RawFinding {
    pub fn new(
        rule_id: impl Into<String>,
        category: Category,
        severity: Severity,
        matched_text: impl Into<String>,
        plain_start: usize,
        plain_end: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            category,
            severity,
            matched_text: matched_text.into(),
            plain_start,
            plain_end,
            message: message.into(),
            fix_text: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix_text = Some(fix.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// Document metadata consulted by the SEO and AI tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub target_keyword: Option<String>,
    pub meta_description: Option<String>,
}

/// Which analyzer tiers a request wants to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TierFlags {
    pub enable_fast: bool,
    pub enable_deep: bool,
    pub enable_seo: bool,
    pub enable_ai: bool,
}

impl Default for TierFlags {
    fn default() -> Self {
        Self {
            enable_fast: true,
            enable_deep: true,
            enable_seo: true,
            enable_ai: false,
        }
    }
}

/// Everything an adapter may read besides the plain text itself. Adapters
/// are pure in `(text, context)`; the fingerprint hashes both.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerContext {
    pub meta: DocumentMeta,
    pub tiers: TierFlags,
}

/// One cached value plus the bookkeeping the eviction policy needs.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: OffsetDateTime,
    pub ttl: time::Duration,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now - self.stored_at > self.ttl
    }
}
