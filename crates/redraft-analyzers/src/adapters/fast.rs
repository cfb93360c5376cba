use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::analyzer::{Analyzer, SourceTier};
use crate::types::{AnalyzerContext, Category, RawFinding, Severity};

/// Correction table for the misspelling scanner. Matched case-insensitively
/// on whole words; the fix re-applies the original leading capitalization.
static MISSPELLINGS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("recieve", "receive"),
    ("seperate", "separate"),
    ("occurence", "occurrence"),
    ("definately", "definitely"),
    ("accomodate", "accommodate"),
    ("alot", "a lot"),
    ("untill", "until"),
    ("wich", "which"),
    ("becuase", "because"),
];

static MISSPELLING_MATCHER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(MISSPELLINGS.iter().map(|(wrong, _)| *wrong))
        .unwrap_or_else(|error| panic!("misspelling automaton failed to build: {error}"))
});

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r" {2,}").unwrap()
});

static PUNCTUATION_RUN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[!?]{2,}").unwrap()
});

/// The synchronous tier: lexical checks cheap enough to run on every
/// debounce tick. Sits in the hot typing path, so it never errors; bad or
/// empty input degrades to no findings.
pub struct FastAnalyzer;

impl FastAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_misspellings(text: &str, out: &mut Vec<RawFinding>) {
        for hit in MISSPELLING_MATCHER.find_iter(text) {
            if !super::word_boundary(text, hit.start(), hit.end()) {
                continue;
            }
            let matched = &text[hit.start()..hit.end()];
            let (_, correction) = MISSPELLINGS[hit.pattern().as_usize()];
            let fix = match_case(matched, correction);
            out.push(
                RawFinding::new(
                    format!("misspelling-{}", MISSPELLINGS[hit.pattern().as_usize()].0),
                    Category::Spelling,
                    Severity::Error,
                    matched,
                    hit.start(),
                    hit.end(),
                    format!("Possible misspelling: did you mean \"{fix}\"?"),
                )
                .with_fix(fix),
            );
        }
    }

    fn check_doubled_words(text: &str, out: &mut Vec<RawFinding>) {
        let mut previous: Option<(usize, &str)> = None;
        for (start, word) in text.unicode_word_indices() {
            if let Some((prev_start, prev_word)) = previous {
                let gap = &text[prev_start + prev_word.len()..start];
                if prev_word.eq_ignore_ascii_case(word)
                    && !gap.is_empty()
                    && gap.chars().all(char::is_whitespace)
                {
                    let end = start + word.len();
                    out.push(
                        RawFinding::new(
                            "doubled-word",
                            Category::Grammar,
                            Severity::Warning,
                            &text[prev_start..end],
                            prev_start,
                            end,
                            format!("The word \"{prev_word}\" is repeated"),
                        )
                        .with_fix(prev_word),
                    );
                }
            }
            previous = Some((start, word));
        }
    }

    fn check_whitespace(text: &str, out: &mut Vec<RawFinding>) {
        for hit in MULTI_SPACE.find_iter(text) {
            out.push(
                RawFinding::new(
                    "multiple-spaces",
                    Category::Style,
                    Severity::Hint,
                    hit.as_str(),
                    hit.start(),
                    hit.end(),
                    "Multiple consecutive spaces",
                )
                .with_fix(" "),
            );
        }
    }

    fn check_punctuation_runs(text: &str, out: &mut Vec<RawFinding>) {
        for hit in PUNCTUATION_RUN.find_iter(text) {
            let first = hit.as_str().chars().next().unwrap_or('!');
            out.push(
                RawFinding::new(
                    "punctuation-run",
                    Category::Style,
                    Severity::Hint,
                    hit.as_str(),
                    hit.start(),
                    hit.end(),
                    "Repeated terminal punctuation",
                )
                .with_fix(first.to_string()),
            );
        }
    }
}

impl Default for FastAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for FastAnalyzer {
    fn id(&self) -> &str {
        "fast"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Fast
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
        Self::check_misspellings(text, &mut findings);
        Self::check_doubled_words(text, &mut findings);
        Self::check_whitespace(text, &mut findings);
        Self::check_punctuation_runs(text, &mut findings);
        Ok(findings)
    }
}

/// Re-apply the matched word's leading capitalization to the correction.
fn match_case(matched: &str, correction: &str) -> String {
    let capitalized = matched.chars().next().is_some_and(char::is_uppercase);
    if !capitalized {
        return correction.to_string();
    }
    let mut chars = correction.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
