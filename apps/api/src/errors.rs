use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::docx::DocxError;
use crate::llm_client::LlmError;
use crate::tailoring::analysis::AnalysisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The taxonomy keeps three user-facing failures apart: "nothing to change"
/// is not an error at all, "could not access the file" maps to
/// `DocumentLocked`, and "could not understand the model's response" maps to
/// `UnintelligibleModelOutput` with the raw output attached.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Document locked after {attempts} attempts")]
    DocumentLocked { attempts: u32 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Could not understand the model's response: {reason}")]
    UnintelligibleModelOutput { reason: String, raw: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DocxError> for AppError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::Locked { attempts } => AppError::DocumentLocked { attempts },
            DocxError::Malformed(msg) => {
                AppError::UnprocessableEntity(format!("malformed document: {msg}"))
            }
            DocxError::Io(err) => AppError::Internal(err.into()),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Unintelligible { reason, raw } => {
                AppError::UnintelligibleModelOutput { reason, raw }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, raw) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg,
                None,
            ),
            AppError::DocumentLocked { attempts } => (
                StatusCode::LOCKED,
                "DOCUMENT_LOCKED",
                format!(
                    "The document is open in another program. Close it and retry \
                     (gave up after {attempts} attempts)."
                ),
                None,
            ),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                    None,
                )
            }
            AppError::UnintelligibleModelOutput { reason, raw } => {
                tracing::error!("Unintelligible model output: {reason}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNINTELLIGIBLE_MODEL_OUTPUT",
                    reason,
                    // Surface the raw response so the user can diagnose it.
                    Some(raw),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "raw_model_output": raw,
            }
        }));

        (status, body).into_response()
    }
}
