use redraft_analyzers::{Category, RawFinding, Severity, SourceTier};
use serde::{Deserialize, Serialize};

use crate::identity;

/// How much surrounding text is kept for display and for the fix
/// applicator's context-mapping fallback.
const CONTEXT_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Fix,
    Highlight,
    Explain,
    Ignore,
    Navigate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Action {
    pub fn fix(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            action_type: ActionType::Fix,
            label: format!("Replace with \"{value}\""),
            value: Some(value),
        }
    }

    pub fn secondary_fix(value: impl Into<String>, source: SourceTier) -> Self {
        let value = value.into();
        Self {
            action_type: ActionType::Fix,
            label: format!("Alternative from {}: \"{value}\"", source.name()),
            value: Some(value),
        }
    }
}

/// The engine's stable unit of output. Identity (`id`) is content-based and
/// survives re-analysis; offsets record where the finding originated in the
/// cycle's snapshot and are advisory by the time a fix is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub category: Category,
    pub sub_category: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub match_text: String,
    pub context_before: String,
    pub context_after: String,
    pub actions: Vec<Action>,
    pub source: SourceTier,
    pub ai_enhanced: bool,
    pub plain_start: usize,
    pub plain_end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Suggestion {
    /// Convert one raw finding into a stable suggestion against the cycle's
    /// plain-text snapshot.
    pub fn from_finding(finding: &RawFinding, tier: SourceTier, full_text: &str) -> Self {
        let id = identity::build_id(
            &finding.rule_id,
            &finding.matched_text,
            finding.plain_start,
            full_text,
        );
        let (context_before, context_after) =
            context_windows(full_text, finding.plain_start, finding.plain_end);

        let mut actions = Vec::new();
        if let Some(fix) = &finding.fix_text {
            actions.push(Action::fix(fix.clone()));
        }
        if !finding.matched_text.is_empty() {
            actions.push(Action {
                action_type: ActionType::Highlight,
                label: "Highlight in document".to_string(),
                value: None,
            });
        }
        if tier.is_ai() {
            actions.push(Action {
                action_type: ActionType::Explain,
                label: "Explain this suggestion".to_string(),
                value: None,
            });
        }
        actions.push(Action {
            action_type: ActionType::Ignore,
            label: "Ignore".to_string(),
            value: None,
        });

        Self {
            id,
            category: finding.category,
            sub_category: finding.rule_id.clone(),
            severity: finding.severity,
            title: title_for(&finding.rule_id, finding.category),
            message: finding.message.clone(),
            match_text: finding.matched_text.clone(),
            context_before,
            context_after,
            actions,
            source: tier,
            ai_enhanced: tier == SourceTier::AiEnhance,
            plain_start: finding.plain_start,
            plain_end: finding.plain_end,
            confidence: finding.confidence,
        }
    }

    pub fn primary_fix(&self) -> Option<&str> {
        self.actions
            .iter()
            .find(|action| action.action_type == ActionType::Fix)
            .and_then(|action| action.value.as_deref())
    }
}

/// Up to [`CONTEXT_CHARS`] characters on each side of the match,
/// char-boundary safe.
fn context_windows(full_text: &str, start: usize, end: usize) -> (String, String) {
    let start = start.min(full_text.len());
    let end = end.clamp(start, full_text.len());

    let mut before_start = start;
    for _ in 0..CONTEXT_CHARS {
        match full_text[..before_start].char_indices().next_back() {
            Some((idx, _)) => before_start = idx,
            None => break,
        }
    }
    let mut after_end = end;
    for _ in 0..CONTEXT_CHARS {
        match full_text[after_end..].chars().next() {
            Some(c) => after_end += c.len_utf8(),
            None => break,
        }
    }
    (
        full_text[before_start..start].to_string(),
        full_text[end..after_end].to_string(),
    )
}

/// Short human title derived from the rule id: `"misspelling-teh"` becomes
/// `"Misspelling teh"`, prefixed titles for document-level SEO rules keep
/// the category name up front.
fn title_for(rule_id: &str, category: Category) -> String {
    let words = rule_id.replace('-', " ");
    let mut chars = words.chars();
    let humanized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => category.display_name().to_string(),
    };
    humanized
}
