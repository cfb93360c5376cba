use async_trait::async_trait;
use time::Duration;
use unicode_segmentation::UnicodeSegmentation;

use crate::analyzer::{Analyzer, SourceTier};
use crate::types::{AnalyzerContext, Category, RawFinding, Severity};

const TITLE_MIN_CHARS: usize = 20;
const TITLE_MAX_CHARS: usize = 60;
const META_MIN_CHARS: usize = 50;
const META_MAX_CHARS: usize = 160;
const MAX_KEYWORD_DENSITY: f64 = 0.03;

/// Metadata-aware checks: target keyword usage, title and meta description
/// bounds. Only meaningful when the caller supplies document metadata; a
/// request without a target keyword gets the structural checks only.
pub struct SeoAnalyzer {
    ttl: Duration,
}

impl SeoAnalyzer {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(1))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    fn check_keyword(text: &str, keyword: &str, out: &mut Vec<RawFinding>) {
        let lower_text = text.to_lowercase();
        let lower_keyword = keyword.to_lowercase();
        let occurrences: Vec<usize> = match_indices_of(&lower_text, &lower_keyword);

        if occurrences.is_empty() {
            out.push(RawFinding::new(
                "seo-keyword-missing",
                Category::Seo,
                Severity::Warning,
                "",
                0,
                0,
                format!("Target keyword \"{keyword}\" does not appear in the body"),
            ));
            return;
        }

        let words = text.unicode_words().count().max(1);
        let density = occurrences.len() as f64 / words as f64;
        if density > MAX_KEYWORD_DENSITY {
            let first = occurrences[0];
            out.push(RawFinding::new(
                "seo-keyword-stuffing",
                Category::Seo,
                Severity::Warning,
                &text[first..first + keyword.len()],
                first,
                first + keyword.len(),
                format!(
                    "Target keyword \"{keyword}\" appears {} times ({:.1}% of words); this reads as keyword stuffing",
                    occurrences.len(),
                    density * 100.0
                ),
            ));
        }
    }

    fn check_title(title: &str, keyword: Option<&str>, out: &mut Vec<RawFinding>) {
        let chars = title.chars().count();
        if chars < TITLE_MIN_CHARS {
            out.push(RawFinding::new(
                "seo-title-short",
                Category::Seo,
                Severity::Hint,
                "",
                0,
                0,
                format!("Title is {chars} characters; search snippets favor {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS}"),
            ));
        } else if chars > TITLE_MAX_CHARS {
            out.push(RawFinding::new(
                "seo-title-long",
                Category::Seo,
                Severity::Hint,
                "",
                0,
                0,
                format!("Title is {chars} characters and will be truncated in search results"),
            ));
        }

        if let Some(keyword) = keyword {
            if !title.to_lowercase().contains(&keyword.to_lowercase()) {
                out.push(RawFinding::new(
                    "seo-keyword-not-in-title",
                    Category::Seo,
                    Severity::Warning,
                    "",
                    0,
                    0,
                    format!("Target keyword \"{keyword}\" is missing from the title"),
                ));
            }
        }
    }

    fn check_meta_description(description: Option<&str>, out: &mut Vec<RawFinding>) {
        match description {
            None => out.push(RawFinding::new(
                "seo-meta-missing",
                Category::Seo,
                Severity::Warning,
                "",
                0,
                0,
                "No meta description is set",
            )),
            Some(description) => {
                let chars = description.chars().count();
                if chars < META_MIN_CHARS {
                    out.push(RawFinding::new(
                        "seo-meta-short",
                        Category::Seo,
                        Severity::Hint,
                        "",
                        0,
                        0,
                        format!("Meta description is {chars} characters; aim for {META_MIN_CHARS}-{META_MAX_CHARS}"),
                    ));
                } else if chars > META_MAX_CHARS {
                    out.push(RawFinding::new(
                        "seo-meta-long",
                        Category::Seo,
                        Severity::Hint,
                        "",
                        0,
                        0,
                        format!("Meta description is {chars} characters and will be truncated"),
                    ));
                }
            }
        }
    }
}

impl Default for SeoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for SeoAnalyzer {
    fn id(&self) -> &str {
        "seo"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Seo
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(self.ttl)
    }

    async fn run(
        &self,
        text: &str,
        context: &AnalyzerContext,
    ) -> anyhow::Result<Vec<RawFinding>> {
        let mut findings = Vec::new();
        let keyword = context.meta.target_keyword.as_deref();

        if let Some(keyword) = keyword {
            if !text.is_empty() {
                Self::check_keyword(text, keyword, &mut findings);
            }
        }
        if let Some(title) = context.meta.title.as_deref() {
            Self::check_title(title, keyword, &mut findings);
        }
        Self::check_meta_description(context.meta.meta_description.as_deref(), &mut findings);

        Ok(findings)
    }
}

fn match_indices_of(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack.match_indices(needle).map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMeta;

    fn context(title: &str, keyword: &str, meta: Option<&str>) -> AnalyzerContext {
        AnalyzerContext {
            meta: DocumentMeta {
                title: Some(title.to_string()),
                target_keyword: Some(keyword.to_string()),
                meta_description: meta.map(ToString::to_string),
            },
            tiers: crate::types::TierFlags::default(),
        }
    }

    async fn run(text: &str, ctx: &AnalyzerContext) -> Vec<RawFinding> {
        SeoAnalyzer::new().run(text, ctx).await.expect("seo analyzer should not error")
    }

    #[tokio::test]
    async fn missing_keyword_is_flagged() {
        let ctx = context("A perfectly sized title here", "ferris", Some("x".repeat(60).as_str()));
        let findings = run("No crustaceans were mentioned in this body.", &ctx).await;
        assert!(findings.iter().any(|f| f.rule_id == "seo-keyword-missing"));
        assert!(findings.iter().any(|f| f.rule_id == "seo-keyword-not-in-title"));
    }

    #[tokio::test]
    async fn keyword_stuffing_is_flagged() {
        let ctx = context("All about ferris the crab", "ferris", Some("x".repeat(60).as_str()));
        let findings = run("ferris ferris ferris ferris loves rust", &ctx).await;
        assert!(findings.iter().any(|f| f.rule_id == "seo-keyword-stuffing"));
    }

    #[tokio::test]
    async fn short_title_and_missing_meta_are_flagged() {
        let ctx = AnalyzerContext {
            meta: DocumentMeta {
                title: Some("Tiny".to_string()),
                target_keyword: None,
                meta_description: None,
            },
            tiers: crate::types::TierFlags::default(),
        };
        let findings = run("Body text without metadata pressure.", &ctx).await;
        assert!(findings.iter().any(|f| f.rule_id == "seo-title-short"));
        assert!(findings.iter().any(|f| f.rule_id == "seo-meta-missing"));
    }

    #[tokio::test]
    async fn satisfied_metadata_yields_nothing() {
        let ctx = context(
            "Ferris the crab learns to write",
            "ferris",
            Some("A long enough meta description about ferris and writing tools for everyone."),
        );
        let body = "Ferris enjoys careful prose. The crab writes every day, edits slowly, \
                    and reads widely before publishing anything. Good writing takes patience, \
                    revision, and honest feedback from readers who care about clarity more \
                    than cleverness or speed.";
        let findings = run(body, &ctx).await;
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }
}
