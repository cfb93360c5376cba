use std::collections::HashMap;

use redraft_analyzers::SourceTier;

use crate::suggestion::{ActionType, Suggestion};

/// Merge per-source suggestion lists into the single published list.
///
/// Findings are grouped by stable id. On an id collision the source with
/// the higher merge priority wins (AI-enhanced fix > deep/SEO > fast >
/// AI-detected); the loser's fix is kept as a secondary action rather than
/// discarded. Ordering is category group first, then ascending origin
/// offset — recomputed on every merge, since occurrence-index churn can
/// reorder findings between passes.
pub fn merge_sources(sources: &HashMap<SourceTier, Vec<Suggestion>>) -> Vec<Suggestion> {
    let mut by_id: HashMap<String, Suggestion> = HashMap::new();

    // Fixed iteration order keeps the merge deterministic regardless of
    // which source resolved first.
    for tier in [
        SourceTier::Fast,
        SourceTier::Deep,
        SourceTier::Seo,
        SourceTier::AiDetect,
        SourceTier::AiEnhance,
    ] {
        let Some(suggestions) = sources.get(&tier) else {
            continue;
        };
        for suggestion in suggestions {
            match by_id.get_mut(&suggestion.id) {
                None => {
                    by_id.insert(suggestion.id.clone(), suggestion.clone());
                }
                Some(existing) => {
                    if suggestion.source.merge_priority() > existing.source.merge_priority() {
                        let mut winner = suggestion.clone();
                        absorb_secondary_fix(&mut winner, existing);
                        *existing = winner;
                    } else {
                        let loser = suggestion.clone();
                        absorb_secondary_fix(existing, &loser);
                    }
                }
            }
        }
    }

    let mut merged: Vec<Suggestion> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then(a.plain_start.cmp(&b.plain_start))
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}

/// Carry the losing source's fix into the winner as a secondary action,
/// unless it duplicates a fix already present.
fn absorb_secondary_fix(winner: &mut Suggestion, loser: &Suggestion) {
    let Some(loser_fix) = loser.primary_fix() else {
        return;
    };
    let already_offered = winner
        .actions
        .iter()
        .filter(|action| action.action_type == ActionType::Fix)
        .any(|action| action.value.as_deref() == Some(loser_fix));
    if already_offered {
        return;
    }
    let insert_at = winner
        .actions
        .iter()
        .rposition(|action| action.action_type == ActionType::Fix)
        .map_or(0, |idx| idx + 1);
    winner.actions.insert(
        insert_at,
        crate::suggestion::Action::secondary_fix(loser_fix, loser.source),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_analyzers::{Category, RawFinding, Severity};

    fn suggestion(tier: SourceTier, rule: &str, text: &str, fix: &str) -> Suggestion {
        let raw = RawFinding::new(rule, Category::Spelling, Severity::Error, text, 0, text.len(), "m")
            .with_fix(fix);
        Suggestion::from_finding(&raw, tier, "Teh cat sat.")
    }

    #[test]
    fn higher_priority_source_wins_collision_and_keeps_loser_fix() {
        let mut sources = HashMap::new();
        sources.insert(
            SourceTier::Fast,
            vec![suggestion(SourceTier::Fast, "misspelling-teh", "Teh", "The")],
        );
        sources.insert(
            SourceTier::AiEnhance,
            vec![suggestion(SourceTier::AiEnhance, "misspelling-teh", "Teh", "The cat")],
        );

        let merged = merge_sources(&sources);
        assert_eq!(merged.len(), 1);
        let winner = &merged[0];
        assert_eq!(winner.source, SourceTier::AiEnhance);
        assert_eq!(winner.primary_fix(), Some("The cat"));

        let fixes: Vec<&str> = winner
            .actions
            .iter()
            .filter(|a| a.action_type == ActionType::Fix)
            .filter_map(|a| a.value.as_deref())
            .collect();
        assert_eq!(fixes, vec!["The cat", "The"]);
    }

    #[test]
    fn detect_tier_loses_to_fast() {
        let mut sources = HashMap::new();
        sources.insert(
            SourceTier::AiDetect,
            vec![suggestion(SourceTier::AiDetect, "misspelling-teh", "Teh", "Th")],
        );
        sources.insert(
            SourceTier::Fast,
            vec![suggestion(SourceTier::Fast, "misspelling-teh", "Teh", "The")],
        );

        let merged = merge_sources(&sources);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceTier::Fast);
        assert_eq!(merged[0].primary_fix(), Some("The"));
    }

    #[test]
    fn duplicate_fix_values_are_not_repeated() {
        let mut sources = HashMap::new();
        sources.insert(
            SourceTier::Fast,
            vec![suggestion(SourceTier::Fast, "misspelling-teh", "Teh", "The")],
        );
        sources.insert(
            SourceTier::Deep,
            vec![suggestion(SourceTier::Deep, "misspelling-teh", "Teh", "The")],
        );

        let merged = merge_sources(&sources);
        let fix_count = merged[0]
            .actions
            .iter()
            .filter(|a| a.action_type == ActionType::Fix)
            .count();
        assert_eq!(fix_count, 1);
    }

    #[test]
    fn ordering_groups_by_category_then_offset() {
        let spelling_late = {
            let raw = RawFinding::new(
                "misspelling-teh",
                Category::Spelling,
                Severity::Error,
                "teh",
                15,
                18,
                "m",
            );
            Suggestion::from_finding(&raw, SourceTier::Fast, "Teh cat sat on teh mat.")
        };
        let style_early = {
            let raw = RawFinding::new(
                "multiple-spaces",
                Category::Style,
                Severity::Hint,
                "  ",
                3,
                5,
                "m",
            );
            Suggestion::from_finding(&raw, SourceTier::Fast, "Teh cat sat on teh mat.")
        };
        let spelling_early = suggestion(SourceTier::Fast, "misspelling-teh", "Teh", "The");

        let mut sources = HashMap::new();
        sources.insert(
            SourceTier::Fast,
            vec![style_early, spelling_late, spelling_early],
        );
        let merged = merge_sources(&sources);
        let order: Vec<(Category, usize)> =
            merged.iter().map(|s| (s.category, s.plain_start)).collect();
        assert_eq!(
            order,
            vec![
                (Category::Spelling, 0),
                (Category::Spelling, 15),
                (Category::Style, 3),
            ]
        );
    }
}
