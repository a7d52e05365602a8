//! Axum route handlers for the tailoring API.

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::docx;
use crate::errors::AppError;
use crate::extract::extract_text;
use crate::state::AppState;
use crate::tailoring::analysis::{resolve_company_name, AnalysisReport};
use crate::tailoring::cover_letter::{generate_cover_letter, render_cover_letter};
use crate::tailoring::naming;
use crate::tailoring::patcher::{apply_suggestions, AppliedChange};
use crate::tailoring::prompts::{
    analysis_system, fill_template, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_TEMPERATURE,
};
use crate::tailoring::suggestions::{parse_suggestions, ParsedSuggestions, SuggestionSource};
use crate::tracker::{
    jd_title, ActivityRecord, ChangeLogRow, JdAnalysisRow, RecordKind, ResumeInventoryRow,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ParseSuggestionsRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub analysis_id: Uuid,
    pub company: String,
    pub jd_title: String,
    pub match_percent: Option<f64>,
    pub suggestion_source: SuggestionSource,
    pub suggestion_count: usize,
    pub applied_count: usize,
    pub applied_changes: Vec<AppliedChange>,
    pub resume_file: String,
    pub cover_letter_file: String,
}

struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/suggestions/parse
///
/// Parses raw model output into suggestions without touching any document.
/// Useful for previewing what a pasted response would do.
pub async fn handle_parse_suggestions(
    Json(request): Json<ParseSuggestionsRequest>,
) -> Result<Json<ParsedSuggestions>, AppError> {
    if request.raw_text.trim().is_empty() {
        return Err(AppError::Validation("raw_text cannot be empty".to_string()));
    }
    Ok(Json(parse_suggestions(&request.raw_text)))
}

/// POST /api/v1/tailor
///
/// Full pipeline: extract text → LLM analysis → parse suggestions → patch
/// resume → cover letter → activity log. Multipart fields: `resume` (.docx),
/// `jd` (.docx or .pdf), optional `company_name`.
pub async fn handle_tailor(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TailorResponse>, AppError> {
    let mut resume: Option<UploadedFile> = None;
    let mut jd: Option<UploadedFile> = None;
    let mut company_input: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        // `bytes()` / `text()` consume the field, so copy the name out first.
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("resume") | Some("jd") => {
                let slot = if field_name.as_deref() == Some("resume") {
                    &mut resume
                } else {
                    &mut jd
                };
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("file field needs a filename".to_string()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                *slot = Some(UploadedFile {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("company_name") => {
                company_input = field.text().await.ok().filter(|s| !s.trim().is_empty());
            }
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::Validation("missing 'resume' file".to_string()))?;
    let jd = jd.ok_or_else(|| AppError::Validation("missing 'jd' file".to_string()))?;

    if !resume.name.to_ascii_lowercase().ends_with(".docx") {
        return Err(AppError::Validation(
            "resume must be a .docx file so replacements can be applied in place".to_string(),
        ));
    }

    let resume_text = extract_text(&resume.name, &resume.bytes)?;
    let jd_text = extract_text(&jd.name, &jd.bytes)?;
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume contains no text".to_string()));
    }
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "job description contains no text".to_string(),
        ));
    }

    let analysis_id = Uuid::new_v4();
    info!("[{analysis_id}] analyzing resume '{}' against JD '{}'", resume.name, jd.name);

    // LLM analysis — the one long-latency step in the pipeline.
    let prompt = fill_template(ANALYSIS_PROMPT_TEMPLATE, &jd_text, &resume_text);
    let raw = state
        .llm
        .call_text(&prompt, &analysis_system(), ANALYSIS_TEMPERATURE)
        .await?;

    let report = AnalysisReport::from_raw(&raw)?;
    let parsed = report.suggestions();
    info!(
        "[{analysis_id}] {} suggestions from {:?}",
        parsed.suggestions.len(),
        parsed.source
    );

    let company = resolve_company_name(company_input.as_deref(), &report);
    let candidate = naming::candidate_name(&resume_text);
    let now = Local::now();
    let resume_filename = naming::resume_filename(&candidate, &company, now);
    let cover_letter_filename = naming::cover_letter_filename(&candidate, &company, now);

    // Stage the upload on disk and acquire it through the lock-retry path —
    // the file may still be open in a word processor on shared setups.
    let staged = tempfile::Builder::new()
        .suffix(".docx")
        .tempfile()
        .map_err(|e| AppError::Internal(e.into()))?;
    std::fs::write(staged.path(), &resume.bytes).map_err(|e| AppError::Internal(e.into()))?;
    let mut doc = docx::open_with_retry(staged.path(), &state.config.lock_retry()).await?;

    let applied_changes = apply_suggestions(doc.paragraphs_mut(), &parsed.suggestions);
    info!(
        "[{analysis_id}] applied {}/{} suggestions",
        applied_changes.len(),
        parsed.suggestions.len()
    );

    tokio::fs::create_dir_all(&state.config.output_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let resume_path = state.config.output_dir.join(&resume_filename);
    doc.save_as(&resume_path)?;

    let letter = generate_cover_letter(&state.llm, &resume_text, &jd_text).await?;
    let letter_bytes = render_cover_letter(&letter)?;
    let letter_path = state.config.output_dir.join(&cover_letter_filename);
    tokio::fs::write(&letter_path, letter_bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let title = jd_title(&company, report.job_title.as_deref());
    let today = now.date_naive();

    let jd_row_id = state
        .tracker
        .next_id(RecordKind::JdAnalysis)
        .await
        .map_err(AppError::Internal)?;
    state
        .tracker
        .append(ActivityRecord::JdAnalysis(JdAnalysisRow {
            id: jd_row_id,
            jd_title: title.clone(),
            company: company.clone(),
            analysis_date: today,
        }))
        .await
        .map_err(AppError::Internal)?;

    let inventory_id = state
        .tracker
        .next_id(RecordKind::ResumeInventory)
        .await
        .map_err(AppError::Internal)?;
    state
        .tracker
        .append(ActivityRecord::ResumeInventory(ResumeInventoryRow {
            id: inventory_id,
            resume_file_name: resume_filename.clone(),
            jd_title: title.clone(),
            match_percent: report.match_percent,
            change_count: applied_changes.len(),
            created_date: today,
        }))
        .await
        .map_err(AppError::Internal)?;

    for change in &applied_changes {
        let change_id = state
            .tracker
            .next_id(RecordKind::ChangeLog)
            .await
            .map_err(AppError::Internal)?;
        state
            .tracker
            .append(ActivityRecord::ChangeLog(ChangeLogRow {
                id: change_id,
                original_resume_file_name: resume.name.clone(),
                resume_file_name: resume_filename.clone(),
                was: change.original_phrase.clone(),
                new: change.replacement_phrase.clone(),
                section: change.section.to_string(),
                jd_title: title.clone(),
            }))
            .await
            .map_err(AppError::Internal)?;
    }

    Ok(Json(TailorResponse {
        analysis_id,
        company,
        jd_title: title,
        match_percent: report.match_percent,
        suggestion_source: parsed.source,
        suggestion_count: parsed.suggestions.len(),
        applied_count: applied_changes.len(),
        applied_changes,
        resume_file: resume_filename,
        cover_letter_file: cover_letter_filename,
    }))
}
