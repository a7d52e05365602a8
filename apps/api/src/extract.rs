//! Plain-text extraction from uploaded resume / JD files.

use crate::docx::DocxDocument;
use crate::errors::AppError;

/// Extracts plain text from an uploaded .docx or .pdf, dispatching on the
/// file extension. Docx text is one line per paragraph.
pub fn extract_text(file_name: &str, data: &[u8]) -> Result<String, AppError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "docx" => Ok(DocxDocument::from_bytes(data)?.text()),
        "pdf" => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| AppError::UnprocessableEntity(format!("failed to read PDF: {e}"))),
        _ => Err(AppError::Validation(format!(
            "Unsupported file type: {file_name} (expected .docx or .pdf)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::write::build_docx;

    #[test]
    fn test_docx_text_is_one_line_per_paragraph() {
        let bytes = build_docx(&["Ada Lovelace", "London", "Skilled in SQL."]).unwrap();
        let text = extract_text("resume.docx", &bytes).unwrap();
        assert_eq!(text, "Ada Lovelace\nLondon\nSkilled in SQL.");
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        let bytes = build_docx(&["hello"]).unwrap();
        assert!(extract_text("Resume.DOCX", &bytes).is_ok());
    }

    #[test]
    fn test_unsupported_extension_is_a_validation_error() {
        let err = extract_text("resume.txt", b"plain").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_corrupt_docx_is_unprocessable() {
        let err = extract_text("resume.docx", b"not a zip").unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
