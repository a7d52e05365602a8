//! Minimal .docx writer for generated documents (cover letters, fixtures).
//!
//! Produces the three mandatory package parts with one run per paragraph,
//! Arial 11pt. Anything fancier (styles part, numbering, headers) is out of
//! scope — generated letters are plain prose.

use std::io::{Cursor, Write as _};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;

use super::DocxError;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Half-points: 22 = 11pt.
const FONT_SIZE_HALF_POINTS: u32 = 22;
const FONT_NAME: &str = "Arial";

/// Builds a complete .docx package from plain paragraph texts.
pub fn build_docx(paragraphs: &[&str]) -> Result<Vec<u8>, DocxError> {
    let mut body = String::new();
    for text in paragraphs {
        if text.is_empty() {
            body.push_str("<w:p/>");
        } else {
            body.push_str(&format!(
                "<w:p><w:r><w:rPr><w:rFonts w:ascii=\"{FONT_NAME}\" w:hAnsi=\"{FONT_NAME}\"/>\
                 <w:sz w:val=\"{FONT_SIZE_HALF_POINTS}\"/></w:rPr>\
                 <w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                escape(*text)
            ));
        }
    }

    let document_xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    let mut cursor = Cursor::new(Vec::new());
    let mut archive = zip::ZipWriter::new(&mut cursor);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document_xml.as_str()),
    ] {
        archive
            .start_file(name, options)
            .map_err(std::io::Error::from)?;
        archive.write_all(content.as_bytes())?;
    }
    archive.finish().map_err(std::io::Error::from)?;

    Ok(cursor.into_inner())
}

/// Renders free text into a .docx, one paragraph per line, lines trimmed.
pub fn build_docx_from_text(text: &str) -> Result<Vec<u8>, DocxError> {
    let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
    build_docx(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::DocxDocument;

    #[test]
    fn test_built_docx_parses_back() {
        let bytes = build_docx(&["Dear Hiring Manager,", "", "I am writing..."]).unwrap();
        let doc = DocxDocument::from_bytes(&bytes).unwrap();
        assert_eq!(
            doc.paragraphs(),
            &["Dear Hiring Manager,", "", "I am writing..."]
        );
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let bytes = build_docx(&["AT&T <senior> \"engineer\""]).unwrap();
        let doc = DocxDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.paragraphs(), &["AT&T <senior> \"engineer\""]);
    }

    #[test]
    fn test_text_rendering_trims_lines() {
        let bytes = build_docx_from_text("  Dear team,\n\n  Regards  \n").unwrap();
        let doc = DocxDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.paragraphs(), &["Dear team,", "", "Regards"]);
    }
}
