mod ai;
mod deep;
mod fast;
mod seo;

pub use ai::{AiClient, AiClientConfig, AiClientError, AiDetectAnalyzer, AiEnhanceAnalyzer};
pub use deep::DeepAnalyzer;
pub use fast::FastAnalyzer;
pub use seo::SeoAnalyzer;

/// Whole-word boundary check shared by the phrase scanners: a hit counts
/// only when not embedded in a longer alphanumeric run.
pub(crate) fn word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = start == 0
        || !text[..start]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
    let after_ok =
        end == text.len() || !text[end..].chars().next().is_some_and(char::is_alphanumeric);
    before_ok && after_ok
}
