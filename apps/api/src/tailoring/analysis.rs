//! Analysis report extraction — pulls the structured ATS report out of the
//! raw model response.
//!
//! Preferred shape is a single JSON object (`JobDescription`, `scoring`,
//! `ResumeImprovementSuggestions`). Models drift, so when the object is
//! absent or broken we degrade to text heuristics: a fenced change-log block
//! or `Replace "X" with "Y"` sentences for the suggestions, plus regex
//! sniffing for company name and score. Only a response yielding nothing at
//! all is an error, and it carries the raw output for diagnosis.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::tailoring::suggestions::{
    parse_suggestions, EditSuggestion, ParsedSuggestions, Section, SuggestionSource,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not understand the model's response: {reason}")]
    Unintelligible { reason: String, raw: String },
}

/// Everything the rest of the pipeline needs from one analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// The raw model output, kept verbatim for diagnosis.
    pub raw: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    /// ATS compatibility score, 0–100.
    pub match_percent: Option<f64>,
    suggestions: Vec<EditSuggestion>,
}

// Report object shape. Entries are lenient here (missing keys default to
// empty and are dropped), unlike the strict fenced-block parser — the object
// report is the primary path and one bad entry should not void the rest.
#[derive(Debug, Deserialize, Default)]
struct AnalysisPayload {
    #[serde(default, alias = "ResumeImprovementSuggestions")]
    resume_improvement_suggestions: Vec<LenientSuggestion>,
    #[serde(default, alias = "JobDescription")]
    job_description: JobDescriptionInfo,
    #[serde(default)]
    scoring: Scoring,
}

#[derive(Debug, Deserialize, Default)]
struct JobDescriptionInfo {
    #[serde(default, alias = "CompanyName")]
    company_name: Option<String>,
    #[serde(default, alias = "JobTitle")]
    job_title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Scoring {
    #[serde(default, alias = "atsCompatibilityScore")]
    ats_compatibility_score: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct LenientSuggestion {
    #[serde(default, alias = "Was")]
    was: String,
    #[serde(default, alias = "New")]
    new: String,
    #[serde(default, alias = "Section")]
    section: Option<String>,
}

impl AnalysisReport {
    pub fn from_raw(raw: &str) -> Result<Self, AnalysisError> {
        if let Some(payload) = extract_payload(raw) {
            let suggestions = payload
                .resume_improvement_suggestions
                .into_iter()
                .filter(|s| !s.was.is_empty())
                .map(|s| EditSuggestion {
                    original_phrase: s.was,
                    replacement_phrase: s.new,
                    section: s.section.map(|l| Section::parse(&l)).unwrap_or(Section::Others),
                })
                .collect();
            return Ok(Self {
                raw: raw.to_string(),
                company_name: payload.job_description.company_name.filter(|s| !s.trim().is_empty()),
                job_title: payload.job_description.job_title.filter(|s| !s.trim().is_empty()),
                match_percent: payload
                    .scoring
                    .ats_compatibility_score
                    .as_ref()
                    .and_then(coerce_percent),
                suggestions,
            });
        }

        // No usable object: fall back to text heuristics.
        let parsed = parse_suggestions(raw);
        let company_name = sniff_company_name(raw);
        let match_percent = sniff_score(raw);

        if parsed.suggestions.is_empty() && company_name.is_none() && match_percent.is_none() {
            let reason = match parsed.source {
                SuggestionSource::MalformedJson { error } => {
                    format!("change log block failed to parse ({error})")
                }
                _ => "no JSON report and no recognizable change log".to_string(),
            };
            return Err(AnalysisError::Unintelligible {
                reason,
                raw: raw.to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            company_name,
            job_title: None,
            match_percent,
            suggestions: parsed.suggestions,
        })
    }

    /// The suggestion list for the patcher, with provenance.
    ///
    /// When the report object carried suggestions they win; otherwise the raw
    /// text is scanned again with the strict fenced/plain-text parser.
    pub fn suggestions(&self) -> ParsedSuggestions {
        if !self.suggestions.is_empty() {
            ParsedSuggestions {
                suggestions: self.suggestions.clone(),
                source: SuggestionSource::Report,
            }
        } else {
            parse_suggestions(&self.raw)
        }
    }
}

/// Company-name precedence: user input beats the model, which beats the
/// placeholder.
pub fn resolve_company_name(user_input: Option<&str>, report: &AnalysisReport) -> String {
    if let Some(input) = user_input {
        let trimmed = input.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    report
        .company_name
        .clone()
        .unwrap_or_else(|| "UnknownCompany".to_string())
}

/// Extracts and parses the outermost `{ … }` span of the raw output.
fn extract_payload(raw: &str) -> Option<AnalysisPayload> {
    let object_span = Regex::new(r"(?s)\{.*\}").expect("hardcoded pattern compiles");
    let span = object_span.find(raw)?;
    match serde_json::from_str::<AnalysisPayload>(span.as_str()) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!("model report span was not a valid JSON object: {err}");
            None
        }
    }
}

/// Accepts `78`, `78.5`, or `"78%"` — score key shape drifts between runs.
fn coerce_percent(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn sniff_company_name(raw: &str) -> Option<String> {
    let pattern = Regex::new(r"(?i)Company(?: Name)?:\s*(.+)").expect("hardcoded pattern compiles");
    pattern
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn sniff_score(raw: &str) -> Option<f64> {
    let pattern = Regex::new(r"(?i)compatibility score.*?(\d+\.?\d*)\s*%")
        .expect("hardcoded pattern compiles");
    pattern.captures(raw).and_then(|c| c[1].parse().ok())
}
