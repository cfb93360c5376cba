use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::analyzer::{Analyzer, SourceTier};
use crate::types::{AnalyzerContext, Category, DocumentMeta, RawFinding, Severity};

#[derive(Debug, Error)]
pub enum AiClientError {
    #[error("AI provider is not configured")]
    NotConfigured,
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("unexpected status code: {0}")]
    Status(StatusCode),
    #[error("malformed provider response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct AiClientConfig {
    /// Base URL of the suggestion provider; `None` disables AI tiers.
    pub endpoint: Option<String>,
    pub timeout: StdDuration,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: StdDuration::from_secs(20),
        }
    }
}

/// HTTP client shared by the detect and enhance adapters.
#[derive(Debug)]
pub struct AiClient {
    http: Client,
    config: AiClientConfig,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    mode: &'a str,
    text: &'a str,
    meta: &'a DocumentMeta,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    findings: Vec<WireFinding>,
}

/// Finding shape on the provider wire. Spans refer to the submitted text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFinding {
    rule_id: String,
    #[serde(default)]
    category: Option<String>,
    matched_text: String,
    start: usize,
    end: usize,
    message: String,
    #[serde(default)]
    fix_text: Option<String>,
    confidence: f64,
}

impl AiClient {
    pub fn new(config: AiClientConfig) -> Self {
        let http = Client::builder()
            .user_agent("redraft/1.0")
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|error| panic!("failed to build reqwest client: {error}"));
        Self { http, config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.endpoint.is_some()
    }

    #[instrument(name = "redraft_analyzers.ai_analyze", skip(self, text, meta))]
    pub async fn analyze(
        &self,
        mode: &str,
        text: &str,
        meta: &DocumentMeta,
    ) -> Result<Vec<RawFinding>, AiClientError> {
        let Some(endpoint) = self.config.endpoint.as_deref() else {
            return Err(AiClientError::NotConfigured);
        };

        let request = AnalyzeRequest { mode, text, meta };
        let response = self
            .http
            .post(format!("{endpoint}/v1/analyze"))
            .json(&request)
            .send()
            .await
            .map_err(|error| AiClientError::Http(error.to_string()))?;

        if !response.status().is_success() {
            return Err(AiClientError::Status(response.status()));
        }

        let payload: AnalyzeResponse = response
            .json()
            .await
            .map_err(|error| AiClientError::Decode(error.to_string()))?;

        debug!(
            target: "redraft_analyzers",
            mode,
            findings = payload.findings.len(),
            "AI provider responded"
        );

        Ok(payload
            .findings
            .into_iter()
            .filter(|finding| finding.end <= text.len() && finding.start <= finding.end)
            .map(|finding| wire_to_raw(finding, mode))
            .collect())
    }
}

fn wire_to_raw(finding: WireFinding, mode: &str) -> RawFinding {
    let category = finding
        .category
        .as_deref()
        .and_then(parse_category)
        .unwrap_or(Category::Clarity);
    let severity = if mode == "enhance" {
        Severity::Hint
    } else {
        Severity::Warning
    };
    let mut raw = RawFinding::new(
        finding.rule_id,
        category,
        severity,
        finding.matched_text,
        finding.start,
        finding.end,
        finding.message,
    )
    .with_confidence(finding.confidence);
    if let Some(fix) = finding.fix_text {
        raw = raw.with_fix(fix);
    }
    raw
}

fn parse_category(name: &str) -> Option<Category> {
    match name {
        "spelling" => Some(Category::Spelling),
        "grammar" => Some(Category::Grammar),
        "style" => Some(Category::Style),
        "readability" => Some(Category::Readability),
        "seo" => Some(Category::Seo),
        "clarity" => Some(Category::Clarity),
        _ => None,
    }
}

/// Remote detection pass: flags likely issues without rewriting them.
/// Provider or transport failure degrades to an empty finding set so the
/// rest of the cycle is unaffected.
pub struct AiDetectAnalyzer {
    client: Arc<AiClient>,
}

impl AiDetectAnalyzer {
    pub fn new(client: Arc<AiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for AiDetectAnalyzer {
    fn id(&self) -> &str {
        "ai-detect"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::AiDetect
    }

    fn cache_ttl(&self) -> Option<time::Duration> {
        Some(time::Duration::hours(1))
    }

    async fn run(
        &self,
        text: &str,
        context: &AnalyzerContext,
    ) -> anyhow::Result<Vec<RawFinding>> {
        run_degrading(&self.client, "detect", text, context).await
    }
}

/// Remote enhancement pass: produces rewritten fixes for flagged ranges.
pub struct AiEnhanceAnalyzer {
    client: Arc<AiClient>,
}

impl AiEnhanceAnalyzer {
    pub fn new(client: Arc<AiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for AiEnhanceAnalyzer {
    fn id(&self) -> &str {
        "ai-enhance"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::AiEnhance
    }

    fn cache_ttl(&self) -> Option<time::Duration> {
        Some(time::Duration::hours(1))
    }

    async fn run(
        &self,
        text: &str,
        context: &AnalyzerContext,
    ) -> anyhow::Result<Vec<RawFinding>> {
        run_degrading(&self.client, "enhance", text, context).await
    }
}

/// AI tiers never propagate failure into the pipeline: suggestions degrade,
/// they do not disappear or crash the cycle.
async fn run_degrading(
    client: &AiClient,
    mode: &str,
    text: &str,
    context: &AnalyzerContext,
) -> anyhow::Result<Vec<RawFinding>> {
    if text.is_empty() || !client.is_configured() {
        return Ok(Vec::new());
    }
    match client.analyze(mode, text, &context.meta).await {
        Ok(findings) => Ok(findings),
        Err(error) => {
            warn!(target: "redraft_analyzers", mode, error = %error, "AI tier degraded to empty result");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_yields_empty_findings() {
        let client = Arc::new(AiClient::new(AiClientConfig::default()));
        let analyzer = AiDetectAnalyzer::new(client);
        let findings = analyzer
            .run("Some text.", &AnalyzerContext::default())
            .await
            .expect("AI tier must not error");
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_empty() {
        let client = Arc::new(AiClient::new(AiClientConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            timeout: StdDuration::from_millis(200),
        }));
        let analyzer = AiEnhanceAnalyzer::new(client);
        let findings = analyzer
            .run("Some text.", &AnalyzerContext::default())
            .await
            .expect("AI tier must not error");
        assert!(findings.is_empty());
    }

    #[test]
    fn wire_category_falls_back_to_clarity() {
        let raw = wire_to_raw(
            WireFinding {
                rule_id: "tone".to_string(),
                category: Some("vibes".to_string()),
                matched_text: "word".to_string(),
                start: 0,
                end: 4,
                message: "m".to_string(),
                fix_text: None,
                confidence: 0.9,
            },
            "detect",
        );
        assert_eq!(raw.category, Category::Clarity);
        assert_eq!(raw.severity, Severity::Warning);
        assert_eq!(raw.confidence, Some(0.9));
    }
}
