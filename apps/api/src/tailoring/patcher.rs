//! Document Patcher — applies edit suggestions to a document's paragraphs.
//!
//! Pure text transformation: no I/O here. Acquiring and saving the underlying
//! .docx resource (including the lock-retry loop) lives in `crate::docx`.
//!
//! Traversal is paragraph order outer, suggestion order inner. Substitutions
//! accumulate within a paragraph, so a later suggestion whose original phrase
//! was introduced by an earlier replacement WILL match — that is intentional
//! sequential-application semantics. Re-applying the same suggestions to an
//! already-patched document is a no-op as long as no replacement reintroduces
//! an original phrase elsewhere.

use regex::{NoExpand, Regex};
use serde::Serialize;
use tracing::debug;

use crate::tailoring::suggestions::{EditSuggestion, Section};

/// A suggestion that was actually matched and substituted into the document.
///
/// Every `AppliedChange` corresponds to exactly one `EditSuggestion`; a
/// suggestion with no match produces zero entries, which is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedChange {
    pub original_phrase: String,
    pub replacement_phrase: String,
    pub section: Section,
    pub paragraph_index: usize,
}

/// Applies `suggestions` to `paragraphs` in place and returns the changes
/// that actually happened, in the order they were made.
///
/// Matching is a case-insensitive substring test against the paragraph's
/// CURRENT text (post any earlier substitution in the same paragraph). On a
/// match, all case-insensitive occurrences are replaced in a single pass with
/// the replacement's casing as supplied. A change is recorded iff the
/// paragraph text actually differs afterwards.
pub fn apply_suggestions(
    paragraphs: &mut [String],
    suggestions: &[EditSuggestion],
) -> Vec<AppliedChange> {
    // One compiled matcher per suggestion, reused across all paragraphs.
    let matchers: Vec<(Regex, &EditSuggestion)> = suggestions
        .iter()
        .filter(|s| !s.original_phrase.is_empty())
        .filter_map(|s| {
            let pattern = format!("(?i){}", regex::escape(&s.original_phrase));
            Regex::new(&pattern).ok().map(|re| (re, s))
        })
        .collect();

    let mut changes = Vec::new();

    for (index, text) in paragraphs.iter_mut().enumerate() {
        for (matcher, suggestion) in &matchers {
            if !matcher.is_match(text) {
                continue;
            }
            // NoExpand: the replacement is literal text, `$` has no meaning.
            let updated = matcher
                .replace_all(text, NoExpand(&suggestion.replacement_phrase))
                .into_owned();
            if updated != *text {
                debug!(
                    paragraph = index,
                    original = %suggestion.original_phrase,
                    "applied replacement"
                );
                *text = updated;
                changes.push(AppliedChange {
                    original_phrase: suggestion.original_phrase.clone(),
                    replacement_phrase: suggestion.replacement_phrase.clone(),
                    section: suggestion.section.clone(),
                    paragraph_index: index,
                });
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(original: &str, replacement: &str, section: Section) -> EditSuggestion {
        EditSuggestion {
            original_phrase: original.to_string(),
            replacement_phrase: replacement.to_string(),
            section,
        }
    }

    #[test]
    fn test_case_insensitive_match_case_preserving_replacement() {
        let mut paragraphs = vec!["Experienced JAVA developer".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[suggestion("java", "Python", Section::Skills)],
        );
        assert_eq!(paragraphs[0], "Experienced Python developer");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].paragraph_index, 0);
    }

    #[test]
    fn test_no_match_is_silent() {
        let mut paragraphs = vec!["Skilled in SQL.".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[suggestion("Kubernetes", "K8s", Section::Others)],
        );
        assert!(changes.is_empty());
        assert_eq!(paragraphs[0], "Skilled in SQL.");
    }

    #[test]
    fn test_all_occurrences_replaced_in_one_pass() {
        let mut paragraphs = vec!["java and Java and JAVA".to_string()];
        let changes =
            apply_suggestions(&mut paragraphs, &[suggestion("java", "Rust", Section::Skills)]);
        assert_eq!(paragraphs[0], "Rust and Rust and Rust");
        // One pass over the paragraph, one recorded change.
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_sequential_accumulation_within_paragraph() {
        let mut paragraphs = vec!["X".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[
                suggestion("X", "Y", Section::Others),
                suggestion("Y", "Z", Section::Others),
            ],
        );
        assert_eq!(paragraphs[0], "Z");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].original_phrase, "X");
        assert_eq!(changes[1].original_phrase, "Y");
    }

    #[test]
    fn test_idempotent_second_pass_when_nothing_reintroduced() {
        let suggestions = vec![
            suggestion("SQL", "advanced SQL", Section::Skills),
            suggestion("reporting", "analytics", Section::Skills),
        ];
        // "advanced SQL" reintroduces "SQL", so restrict to the second
        // suggestion for the strict idempotence check.
        let mut paragraphs = vec!["Skilled in reporting.".to_string()];
        let first = apply_suggestions(&mut paragraphs, &suggestions[1..]);
        assert_eq!(first.len(), 1);
        let after_first = paragraphs.clone();
        let second = apply_suggestions(&mut paragraphs, &suggestions[1..]);
        assert!(second.is_empty());
        assert_eq!(paragraphs, after_first);
    }

    #[test]
    fn test_identical_replacement_records_no_change() {
        let mut paragraphs = vec!["Led the platform team.".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[suggestion("Led", "Led", Section::CareerExperience)],
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_case_only_difference_counts_as_change() {
        // Before != after even though the phrases are equal ignoring case.
        let mut paragraphs = vec!["JAVA developer".to_string()];
        let changes =
            apply_suggestions(&mut paragraphs, &[suggestion("java", "java", Section::Skills)]);
        assert_eq!(paragraphs[0], "java developer");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_dollar_signs_in_replacement_are_literal() {
        let mut paragraphs = vec!["Saved costs.".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[suggestion("costs", "$2M in costs", Section::Accomplishments)],
        );
        assert_eq!(paragraphs[0], "Saved $2M in costs.");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_empty_document_and_empty_suggestions_are_valid() {
        let mut none: Vec<String> = Vec::new();
        assert!(apply_suggestions(&mut none, &[suggestion("a", "b", Section::Others)]).is_empty());

        let mut paragraphs = vec!["text".to_string()];
        assert!(apply_suggestions(&mut paragraphs, &[]).is_empty());
        assert_eq!(paragraphs[0], "text");
    }

    #[test]
    fn test_duplicate_suggestions_produce_single_change() {
        let mut paragraphs = vec!["Skilled in SQL.".to_string()];
        let pair = suggestion("SQL", "data modeling", Section::Skills);
        let changes = apply_suggestions(&mut paragraphs, &[pair.clone(), pair]);
        // The duplicate finds nothing left to match: the replacement does not
        // reintroduce the original phrase.
        assert_eq!(paragraphs[0], "Skilled in data modeling.");
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_change_order_is_paragraph_outer_suggestion_inner() {
        let mut paragraphs = vec!["alpha beta".to_string(), "beta alpha".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[
                suggestion("alpha", "one", Section::Others),
                suggestion("beta", "two", Section::Others),
            ],
        );
        let order: Vec<(usize, &str)> = changes
            .iter()
            .map(|c| (c.paragraph_index, c.original_phrase.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "alpha"), (0, "beta"), (1, "alpha"), (1, "beta")]);
    }

    #[test]
    fn test_resume_skills_scenario() {
        let mut paragraphs = vec!["Skilled in SQL and reporting.".to_string()];
        let changes = apply_suggestions(
            &mut paragraphs,
            &[suggestion("SQL", "advanced SQL and data modeling", Section::Skills)],
        );
        assert_eq!(paragraphs[0], "Skilled in advanced SQL and data modeling and reporting.");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].section, Section::Skills);
    }
}
