//! Cover-letter generation: one LLM call, rendered to a plain .docx.

use crate::docx::{write::build_docx_from_text, DocxError};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::tailoring::prompts::{
    cover_letter_system, fill_template, COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_TEMPERATURE,
};

/// Generates the cover-letter text for a resume / JD pair.
pub async fn generate_cover_letter(
    llm: &LlmClient,
    resume_text: &str,
    jd_text: &str,
) -> Result<String, AppError> {
    let prompt = fill_template(COVER_LETTER_PROMPT_TEMPLATE, jd_text, resume_text);
    llm.call_text(&prompt, &cover_letter_system(), COVER_LETTER_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("cover letter generation failed: {e}")))
}

/// Renders cover-letter prose into a .docx, one paragraph per line.
pub fn render_cover_letter(text: &str) -> Result<Vec<u8>, DocxError> {
    build_docx_from_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::DocxDocument;

    #[test]
    fn test_rendered_letter_keeps_paragraph_breaks() {
        let letter = "Dear Hiring Manager,\n\nI am excited about this opportunity.\n\nRegards,\nAda";
        let bytes = render_cover_letter(letter).unwrap();
        let doc = DocxDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.paragraphs().len(), 6);
        assert_eq!(doc.paragraphs()[0], "Dear Hiring Manager,");
        assert_eq!(doc.paragraphs()[5], "Ada");
    }
}
