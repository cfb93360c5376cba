/// Stable, content-based suggestion identity.
///
/// Ids are derived from the rule, the matched text, and how many earlier
/// occurrences of that text precede the match — never from raw offsets — so
/// an unrelated edit elsewhere in the document leaves an untouched
/// suggestion's identity alone. Inserting a new *earlier* occurrence of the
/// same text shifts every later occurrence index by one; that churn is the
/// documented contract, and it is consistent: occurrence N becomes N + 1.
const ID_PREFIX_LEN: usize = 8;
const WIDEN_CHARS: usize = 10;

/// Build the stable id for one finding.
///
/// `plain_start` is the byte offset of `matched_text` in `full_text`.
pub fn build_id(rule_id: &str, matched_text: &str, plain_start: usize, full_text: &str) -> String {
    let occurrence = occurrence_index(matched_text, plain_start, full_text);
    format!(
        "{rule_id}-{}-{occurrence}",
        normalized_prefix(matched_text, ID_PREFIX_LEN)
    )
}

/// 0-based count of case-insensitive occurrences of `matched_text` strictly
/// before `plain_start`. Disambiguates the third "it" from the first.
pub fn occurrence_index(matched_text: &str, plain_start: usize, full_text: &str) -> usize {
    if matched_text.is_empty() {
        return 0;
    }
    let haystack = full_text.to_lowercase();
    let needle = matched_text.to_lowercase();
    haystack
        .match_indices(&needle)
        .take_while(|(idx, _)| *idx < plain_start)
        .count()
}

/// Lowercased, alphanumeric-only prefix of the matched text.
pub fn normalized_prefix(matched_text: &str, max_chars: usize) -> String {
    matched_text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .take(max_chars)
        .collect()
}

/// Widen very short matches to ±`WIDEN_CHARS` characters of surrounding
/// text. Single letters and two-character words are not unique enough to
/// carry context on their own; the widened window is what feeds context
/// matching in the fix applicator.
///
/// Returns the widened slice and its start offset in `full_text`.
pub fn widen_match<'a>(
    matched_text: &str,
    plain_start: usize,
    full_text: &'a str,
) -> (&'a str, usize) {
    let plain_end = (plain_start + matched_text.len()).min(full_text.len());
    let plain_start = plain_start.min(plain_end);
    if matched_text.chars().count() > 2 {
        return (&full_text[plain_start..plain_end], plain_start);
    }

    let mut start = plain_start;
    for _ in 0..WIDEN_CHARS {
        match full_text[..start].char_indices().next_back() {
            Some((idx, _)) => start = idx,
            None => break,
        }
    }
    let mut end = plain_end;
    for _ in 0..WIDEN_CHARS {
        match full_text[end..].chars().next() {
            Some(c) => end += c.len_utf8(),
            None => break,
        }
    }
    (&full_text[start..end], start)
}
