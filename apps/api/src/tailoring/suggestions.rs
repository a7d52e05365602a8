//! Suggestion Parser — turns raw model output into an ordered list of edit suggestions.
//!
//! Precedence is strict, first match wins:
//! 1. A fenced ```json array block of `{was, new, section?}` objects.
//! 2. Plain-text sentences of the shape `Replace "X" with "Y"`.
//!
//! A fenced block that is valid JSON but has entries missing `was`/`new` keys
//! discards the ENTIRE list (reference behavior, kept deliberately — see
//! DESIGN.md). A block that is not even valid JSON falls through to the
//! plain-text scan. Degenerate input yields an empty list, never an error.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Resume section a suggestion pertains to.
///
/// The closed set mirrors the section taxonomy the analysis prompt asks the
/// model to classify into. Unrecognized non-empty labels are preserved
/// verbatim via `Other` so the change log keeps whatever the model said;
/// absent or empty labels default to `Others`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Section {
    Head,
    TargetPosition,
    ProfessionalProfile,
    Expertises,
    Accomplishments,
    CareerExperience,
    Skills,
    Certifications,
    Education,
    Others,
    Other(String),
}

impl Section {
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "head" => Section::Head,
            "target position" => Section::TargetPosition,
            "professional profile" => Section::ProfessionalProfile,
            "expertises" => Section::Expertises,
            "accomplishments" => Section::Accomplishments,
            "career experience" => Section::CareerExperience,
            "skills" => Section::Skills,
            "certifications" => Section::Certifications,
            "education" => Section::Education,
            "others" | "" => Section::Others,
            _ => Section::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Section::Head => "Head",
            Section::TargetPosition => "Target Position",
            Section::ProfessionalProfile => "Professional Profile",
            Section::Expertises => "Expertises",
            Section::Accomplishments => "Accomplishments",
            Section::CareerExperience => "Career Experience",
            Section::Skills => "Skills",
            Section::Certifications => "Certifications",
            Section::Education => "Education",
            Section::Others => "Others",
            Section::Other(label) => label,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Section {
    fn from(value: String) -> Self {
        Section::parse(&value)
    }
}

impl From<Section> for String {
    fn from(value: Section) -> Self {
        value.as_str().to_string()
    }
}

/// A single proposed edit. Immutable once parsed, consumed once by the patcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSuggestion {
    pub original_phrase: String,
    pub replacement_phrase: String,
    pub section: Section,
}

/// Which path of the parser produced the suggestions.
///
/// Returned alongside the list so callers can distinguish "nothing to change"
/// from "could not understand the model's response" without a process-wide
/// cache of parser state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionSource {
    /// Structured entries from the analysis report object.
    Report,
    JsonBlock,
    PlainText,
    /// A fenced block parsed as JSON but entries were missing required keys.
    /// The whole list is discarded in this case.
    MalformedJson { error: String },
    Empty,
}

/// Result of one parse pass: the ordered suggestions plus their provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSuggestions {
    pub suggestions: Vec<EditSuggestion>,
    pub source: SuggestionSource,
}

/// Shape of one entry inside the fenced JSON array. Key casing from the model
/// drifts between `was`/`Was` etc., so both are accepted.
#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(alias = "Was")]
    was: String,
    #[serde(alias = "New")]
    new: String,
    #[serde(alias = "Section")]
    section: Option<String>,
}

impl RawSuggestion {
    fn into_suggestion(self) -> Option<EditSuggestion> {
        // An empty original can never match a span; drop it here rather than
        // letting the patcher substitute at every position.
        if self.was.is_empty() {
            return None;
        }
        Some(EditSuggestion {
            original_phrase: self.was,
            replacement_phrase: self.new,
            section: self.section.map(|s| Section::parse(&s)).unwrap_or(Section::Others),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────────────────

fn json_fence_pattern() -> Regex {
    Regex::new(r"(?s)```json\s*(\[.*?\])\s*```").expect("hardcoded pattern compiles")
}

fn replace_sentence_pattern() -> Regex {
    Regex::new(r#"(?i)replace [“"](.+?)[”"] with [“"](.+?)[”"]"#).expect("hardcoded pattern compiles")
}

/// Parses raw model output into an ordered suggestion list.
///
/// Order equals order of first appearance in the input. Duplicates are kept;
/// the patcher is idempotent per paragraph so they are harmless.
pub fn parse_suggestions(raw: &str) -> ParsedSuggestions {
    if let Some(captures) = json_fence_pattern().captures(raw) {
        let block = &captures[1];
        match serde_json::from_str::<serde_json::Value>(block) {
            Ok(value) => {
                // Syntactically valid JSON: this is authoritative. Entries
                // missing required keys discard the whole list — we never
                // also scan the surrounding text.
                return match serde_json::from_value::<Vec<RawSuggestion>>(value) {
                    Ok(entries) => {
                        let suggestions: Vec<EditSuggestion> = entries
                            .into_iter()
                            .filter_map(RawSuggestion::into_suggestion)
                            .collect();
                        let source = if suggestions.is_empty() {
                            SuggestionSource::Empty
                        } else {
                            SuggestionSource::JsonBlock
                        };
                        ParsedSuggestions { suggestions, source }
                    }
                    Err(err) => {
                        warn!("Failed to read JSON change log entries: {err}");
                        ParsedSuggestions {
                            suggestions: Vec::new(),
                            source: SuggestionSource::MalformedJson {
                                error: err.to_string(),
                            },
                        }
                    }
                };
            }
            Err(err) => {
                // Not valid JSON at all — treat the fence as noise and fall
                // back to the plain-text scan.
                warn!("Fenced JSON change log did not parse: {err}");
            }
        }
    }

    let suggestions: Vec<EditSuggestion> = replace_sentence_pattern()
        .captures_iter(raw)
        .map(|c| EditSuggestion {
            original_phrase: c[1].to_string(),
            replacement_phrase: c[2].to_string(),
            section: Section::Others,
        })
        .collect();

    let source = if suggestions.is_empty() {
        SuggestionSource::Empty
    } else {
        SuggestionSource::PlainText
    };
    ParsedSuggestions { suggestions, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_block_preserves_order() {
        let raw = "Here is the change log:\n```json\n[{\"was\":\"A\",\"new\":\"B\"},{\"was\":\"C\",\"new\":\"D\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.source, SuggestionSource::JsonBlock);
        assert_eq!(parsed.suggestions.len(), 2);
        assert_eq!(parsed.suggestions[0].original_phrase, "A");
        assert_eq!(parsed.suggestions[0].replacement_phrase, "B");
        assert_eq!(parsed.suggestions[1].original_phrase, "C");
        assert_eq!(parsed.suggestions[1].replacement_phrase, "D");
    }

    #[test]
    fn test_json_block_accepts_capitalized_keys_and_section() {
        let raw = "```json\n[{\"Was\":\"old\",\"New\":\"new\",\"Section\":\"Skills\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].section, Section::Skills);
    }

    #[test]
    fn test_json_block_defaults_missing_section_to_others() {
        let raw = "```json\n[{\"was\":\"old\",\"new\":\"new\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.suggestions[0].section, Section::Others);
    }

    #[test]
    fn test_plain_text_fallback() {
        let raw = "You should Replace \"Java\" with \"Python\" in your skills.";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.source, SuggestionSource::PlainText);
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].original_phrase, "Java");
        assert_eq!(parsed.suggestions[0].replacement_phrase, "Python");
        assert_eq!(parsed.suggestions[0].section, Section::Others);
    }

    #[test]
    fn test_plain_text_accepts_curly_quotes() {
        let raw = "replace “managed” with “led” for stronger verbs.";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].original_phrase, "managed");
        assert_eq!(parsed.suggestions[0].replacement_phrase, "led");
    }

    #[test]
    fn test_json_block_wins_over_plain_text() {
        let raw = "Replace \"X\" with \"Y\".\n```json\n[{\"was\":\"A\",\"new\":\"B\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.source, SuggestionSource::JsonBlock);
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].original_phrase, "A");
    }

    #[test]
    fn test_invalid_json_syntax_returns_empty_without_panicking() {
        let raw = "```json\n[{\"was\": \"A\", \"new\": ]\n```";
        let parsed = parse_suggestions(raw);
        assert!(parsed.suggestions.is_empty());
        assert_eq!(parsed.source, SuggestionSource::Empty);
    }

    #[test]
    fn test_invalid_json_syntax_still_scans_plain_text() {
        let raw = "```json\n[{broken]\n```\nAlso Replace \"A\" with \"B\".";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.source, SuggestionSource::PlainText);
        assert_eq!(parsed.suggestions.len(), 1);
    }

    #[test]
    fn test_missing_required_key_discards_entire_list() {
        // First entry is fine, second lacks `new`. The whole list goes.
        let raw = "```json\n[{\"was\":\"A\",\"new\":\"B\"},{\"was\":\"C\"}]\n```\nReplace \"A\" with \"B\".";
        let parsed = parse_suggestions(raw);
        assert!(parsed.suggestions.is_empty());
        assert!(matches!(parsed.source, SuggestionSource::MalformedJson { .. }));
    }

    #[test]
    fn test_empty_input_yields_empty_list() {
        let parsed = parse_suggestions("");
        assert!(parsed.suggestions.is_empty());
        assert_eq!(parsed.source, SuggestionSource::Empty);
    }

    #[test]
    fn test_duplicates_are_not_deduplicated() {
        let raw = "```json\n[{\"was\":\"A\",\"new\":\"B\"},{\"was\":\"A\",\"new\":\"B\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.suggestions.len(), 2);
    }

    #[test]
    fn test_empty_original_phrase_is_dropped() {
        let raw = "```json\n[{\"was\":\"\",\"new\":\"B\"},{\"was\":\"C\",\"new\":\"D\"}]\n```";
        let parsed = parse_suggestions(raw);
        assert_eq!(parsed.suggestions.len(), 1);
        assert_eq!(parsed.suggestions[0].original_phrase, "C");
    }

    #[test]
    fn test_section_parse_is_case_insensitive_with_verbatim_fallback() {
        assert_eq!(Section::parse("skills"), Section::Skills);
        assert_eq!(Section::parse("CAREER EXPERIENCE"), Section::CareerExperience);
        assert_eq!(Section::parse(""), Section::Others);
        assert_eq!(
            Section::parse("Volunteering"),
            Section::Other("Volunteering".to_string())
        );
    }
}
