use thiserror::Error;
use tracing::debug;

use crate::document::{DocNode, Document};
use crate::position::{OffsetIndex, SpanKind};
use crate::suggestion::Suggestion;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("suggestion has no fix action")]
    NoFixAction,
    #[error("could not locate text to fix, it may have changed: {reason}")]
    CouldNotLocate { reason: String },
}

/// Result of a successful fix: the plain range that was replaced and the
/// length delta the edit introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFix {
    pub plain_start: usize,
    pub plain_end: usize,
    pub replacement: String,
    pub delta: isize,
}

/// Apply a suggestion's primary fix to the document.
///
/// Resolution tries three strategies in order, first success wins:
/// 1. direct mapping — the recorded offsets, validated against the current
///    text (the content must still match, not merely be in bounds);
/// 2. search mapping — literal occurrences of the matched text, the one
///    closest to the recorded offset;
/// 3. context mapping — `before + match + after`, for when the bare match
///    occurs many times but the immediate context is unique.
///
/// Failure is recoverable by contract: the caller decides whether to retry,
/// ask the user, or drop the suggestion.
pub fn apply(document: &mut Document, suggestion: &Suggestion) -> Result<AppliedFix, FixError> {
    let replacement = suggestion
        .primary_fix()
        .ok_or(FixError::NoFixAction)?
        .to_string();

    let index = OffsetIndex::build(document);
    let text = index.plain_text().to_string();
    let (start, end) = resolve_range(&text, suggestion)?;

    splice(document, &index, start, end, &replacement)?;

    let delta = replacement.len() as isize - (end - start) as isize;
    shift_selection(document, start, end, delta);
    document.version += 1;

    debug!(
        target: "redraft_engine",
        suggestion = %suggestion.id,
        start,
        end,
        delta,
        "applied fix"
    );

    Ok(AppliedFix {
        plain_start: start,
        plain_end: end,
        replacement,
        delta,
    })
}

fn resolve_range(text: &str, suggestion: &Suggestion) -> Result<(usize, usize), FixError> {
    if let Some(range) = direct_mapping(text, suggestion) {
        return Ok(range);
    }
    if let Some(range) = search_mapping(text, suggestion) {
        debug!(
            target: "redraft_engine",
            suggestion = %suggestion.id,
            "direct mapping failed; resolved by search"
        );
        return Ok(range);
    }
    if let Some(range) = context_mapping(text, suggestion) {
        debug!(
            target: "redraft_engine",
            suggestion = %suggestion.id,
            "resolved by context search"
        );
        return Ok(range);
    }
    Err(FixError::CouldNotLocate {
        reason: format!("no occurrence of \"{}\" found", suggestion.match_text),
    })
}

/// Strategy 1: the recorded offsets are still valid iff the text under them
/// is unchanged.
fn direct_mapping(text: &str, suggestion: &Suggestion) -> Option<(usize, usize)> {
    let (start, end) = (suggestion.plain_start, suggestion.plain_end);
    if suggestion.match_text.is_empty() || end > text.len() || start > end {
        return None;
    }
    if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return None;
    }
    (&text[start..end] == suggestion.match_text).then_some((start, end))
}

/// Strategy 2: find the literal match closest to where it used to be. A
/// unique occurrence is taken as-is; with several candidates the closest
/// one must also agree with the recorded context, otherwise resolution
/// falls through to the context strategy.
fn search_mapping(text: &str, suggestion: &Suggestion) -> Option<(usize, usize)> {
    if suggestion.match_text.is_empty() {
        return None;
    }
    let occurrences: Vec<(usize, usize)> = text
        .match_indices(&suggestion.match_text)
        .map(|(idx, matched)| (idx, idx + matched.len()))
        .collect();
    match occurrences.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => {
            let origin = suggestion.plain_start;
            occurrences
                .into_iter()
                .min_by_key(|(idx, _)| idx.abs_diff(origin))
                .filter(|&(idx, end)| {
                    text[..idx].ends_with(&suggestion.context_before)
                        && text[end..].starts_with(&suggestion.context_after)
                })
        }
    }
}

/// Strategy 3: disambiguate through the recorded context window.
fn context_mapping(text: &str, suggestion: &Suggestion) -> Option<(usize, usize)> {
    if suggestion.match_text.is_empty() {
        return None;
    }
    let needle = format!(
        "{}{}{}",
        suggestion.context_before, suggestion.match_text, suggestion.context_after
    );
    if needle == suggestion.match_text {
        return None;
    }
    text.find(&needle).map(|idx| {
        let start = idx + suggestion.context_before.len();
        (start, start + suggestion.match_text.len())
    })
}

/// Replace `[start, end)` of the plain projection with `replacement`,
/// splicing through the offset index into the underlying leaves. The range
/// may span several leaves of one block; a range crossing a block boundary
/// is refused, since plain replacement text cannot express a block merge.
fn splice(
    document: &mut Document,
    index: &OffsetIndex,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<(), FixError> {
    let spans = index.spans_in(start..end);
    if spans.is_empty() {
        return Err(FixError::CouldNotLocate {
            reason: "resolved range is outside the document".to_string(),
        });
    }
    if spans.iter().any(|span| span.kind == SpanKind::Boundary) {
        return Err(FixError::CouldNotLocate {
            reason: "resolved range crosses a block boundary".to_string(),
        });
    }

    let mut replacement_left = Some(replacement);
    for span in spans {
        let local_start = start.max(span.plain_start) - span.plain_start;
        let local_end = end.min(span.plain_end()) - span.plain_start;
        let leaf = leaf_text_mut(&mut document.root, &span.path).ok_or_else(|| {
            FixError::CouldNotLocate {
                reason: "index no longer matches the tree".to_string(),
            }
        })?;
        let insert = replacement_left.take().unwrap_or("");
        let mut rebuilt = String::with_capacity(leaf.len() + insert.len());
        rebuilt.push_str(&leaf[..local_start]);
        rebuilt.push_str(insert);
        rebuilt.push_str(&leaf[local_end..]);
        *leaf = rebuilt;
    }
    Ok(())
}

fn leaf_text_mut<'a>(node: &'a mut DocNode, path: &[usize]) -> Option<&'a mut String> {
    match path.split_first() {
        None => node.text.as_mut(),
        Some((&idx, rest)) => leaf_text_mut(node.content.as_mut()?.get_mut(idx)?, rest),
    }
}

/// Shift a selection that falls after the edited range by the length delta;
/// clamp endpoints that fell inside the replaced range to its new end.
fn shift_selection(document: &mut Document, start: usize, end: usize, delta: isize) {
    let Some(selection) = document.selection.as_mut() else {
        return;
    };
    let new_end_of_fix = end.saturating_add_signed(delta);
    let shift = |offset: usize| -> usize {
        if offset <= start {
            offset
        } else if offset >= end {
            offset.saturating_add_signed(delta)
        } else {
            new_end_of_fix
        }
    };
    *selection = shift(selection.start)..shift(selection.end);
}
