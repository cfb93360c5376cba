use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use time::Duration;
use unicode_segmentation::UnicodeSegmentation;

use crate::analyzer::{Analyzer, SourceTier};
use crate::types::{AnalyzerContext, Category, RawFinding, Severity};

const MAX_SENTENCE_WORDS: usize = 30;
const MAX_PARAGRAPH_WORDS: usize = 120;

/// Filler vocabulary that reads as padding. Throttled, not banned: each
/// occurrence is a hint, and a few carry a plainer replacement.
static BUZZWORDS: &[(&str, Option<&str>)] = &[
    ("utilize", Some("use")),
    ("utilise", Some("use")),
    ("leverage", Some("use")),
    ("facilitate", Some("help")),
    ("in order to", Some("to")),
    ("delve", None),
    ("synergy", None),
    ("seamless", None),
    ("robust", None),
    ("cutting-edge", None),
    ("paradigm", None),
    ("holistic", None),
];

static BUZZWORD_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(BUZZWORDS.iter().map(|(word, _)| *word))
        .unwrap_or_else(|error| panic!("buzzword automaton failed to build: {error}"))
});

static PASSIVE_VOICE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b(?:was|were|is|are|been|being|be)\s+(\w+ed)\b").unwrap()
});

/// The deep tier: readability and style analysis that is too expensive for
/// the per-keystroke path. Always cached; invoked on the longer debounce.
pub struct DeepAnalyzer {
    ttl: Duration,
}

impl DeepAnalyzer {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(1))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    fn check_sentence_length(text: &str, out: &mut Vec<RawFinding>) {
        for (start, sentence) in text.split_sentence_bound_indices() {
            let words = sentence.unicode_words().count();
            if words > MAX_SENTENCE_WORDS {
                out.push(RawFinding::new(
                    "long-sentence",
                    Category::Readability,
                    Severity::Warning,
                    sentence.trim_end(),
                    start,
                    start + sentence.trim_end().len(),
                    format!("Sentence has {words} words; consider splitting it (target <= {MAX_SENTENCE_WORDS})"),
                ));
            }
        }
    }

    fn check_paragraph_length(text: &str, out: &mut Vec<RawFinding>) {
        let mut offset = 0;
        for paragraph in text.split('\n') {
            let words = paragraph.unicode_words().count();
            if words > MAX_PARAGRAPH_WORDS {
                out.push(RawFinding::new(
                    "long-paragraph",
                    Category::Readability,
                    Severity::Hint,
                    paragraph,
                    offset,
                    offset + paragraph.len(),
                    format!("Paragraph has {words} words; consider breaking it up"),
                ));
            }
            offset += paragraph.len() + 1;
        }
    }

    fn check_buzzwords(text: &str, out: &mut Vec<RawFinding>) {
        for hit in BUZZWORD_MATCHER.find_iter(text) {
            let (word, replacement) = BUZZWORDS[hit.pattern().as_usize()];
            if !super::word_boundary(text, hit.start(), hit.end()) {
                continue;
            }
            let mut finding = RawFinding::new(
                format!("buzzword-{}", word.replace(' ', "-")),
                Category::Style,
                Severity::Hint,
                &text[hit.start()..hit.end()],
                hit.start(),
                hit.end(),
                format!("\"{word}\" reads as filler; prefer plainer wording"),
            );
            if let Some(plain) = replacement {
                finding = finding.with_fix(plain);
            }
            out.push(finding);
        }
    }

    fn check_passive_voice(text: &str, out: &mut Vec<RawFinding>) {
        for captures in PASSIVE_VOICE.captures_iter(text) {
            if let Some(whole) = captures.get(0) {
                out.push(RawFinding::new(
                    "passive-voice",
                    Category::Clarity,
                    Severity::Hint,
                    whole.as_str(),
                    whole.start(),
                    whole.end(),
                    "Possible passive voice; consider an active construction",
                ));
            }
        }
    }
}

impl Default for DeepAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for DeepAnalyzer {
    fn id(&self) -> &str {
        "deep"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Deep
    }

    fn cache_ttl(&self) -> Option<Duration> {
        Some(self.ttl)
    }

    async fn run(
        &self,
        text: &str,
        _context: &AnalyzerContext,
    ) -> anyhow::Result<Vec<RawFinding>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let mut findings = Vec::new();
        Self::check_sentence_length(text, &mut findings);
        Self::check_paragraph_length(text, &mut findings);
        Self::check_buzzwords(text, &mut findings);
        Self::check_passive_voice(text, &mut findings);
        Ok(findings)
    }
}
