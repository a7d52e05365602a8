//! The .docx document container: ordered paragraphs with mutable text.
//!
//! Reads the OPC zip package, exposes `word/document.xml` paragraph text for
//! the patcher, and writes the package back with unrelated parts (styles,
//! relationships, media) preserved byte-for-byte. A modified paragraph is
//! re-serialized as a single run carrying the new text, keeping the paragraph
//! properties (`w:pPr`) intact.
//!
//! Acquisition goes through `open_with_retry`: a file held open by a word
//! processor surfaces as a distinct `DocxError::Locked` after a bounded
//! backoff loop, never as a crash or a silently dropped mutation.

use std::io::Cursor;
use std::io::Read as _;
use std::path::Path;
use std::time::Duration;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use tracing::warn;
use zip::write::SimpleFileOptions;

pub mod write;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("document is locked by another process (gave up after {attempts} attempts)")]
    Locked { attempts: u32 },

    #[error("malformed .docx container: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn xml_err<E: std::fmt::Display>(err: E) -> DocxError {
    DocxError::Malformed(err.to_string())
}

/// Bounds for the lock-retry acquisition loop.
#[derive(Debug, Clone, Copy)]
pub struct LockRetry {
    /// Total open attempts before giving up. Must be at least 1.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for LockRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

/// An in-memory .docx document: every package part plus the parsed paragraph
/// texts. Owned exclusively by one patch operation for its duration.
#[derive(Debug)]
pub struct DocxDocument {
    /// All zip entries in original order, `word/document.xml` included.
    parts: Vec<(String, Vec<u8>)>,
    document_xml: String,
    original_paragraphs: Vec<String>,
    paragraphs: Vec<String>,
}

impl DocxDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocxError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(xml_err)?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(xml_err)?;
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            parts.push((entry.name().to_string(), bytes));
        }

        let document_xml = parts
            .iter()
            .find(|(name, _)| name == DOCUMENT_PART)
            .map(|(_, bytes)| String::from_utf8(bytes.clone()))
            .ok_or_else(|| DocxError::Malformed(format!("missing {DOCUMENT_PART}")))?
            .map_err(xml_err)?;

        let paragraphs = parse_paragraphs(&document_xml)?;

        Ok(Self {
            parts,
            document_xml,
            original_paragraphs: paragraphs.clone(),
            paragraphs,
        })
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Mutable view for the patcher. The paragraph count is fixed; only text
    /// content may change.
    pub fn paragraphs_mut(&mut self) -> &mut [String] {
        &mut self.paragraphs
    }

    /// Plain text of the whole document, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    pub fn is_modified(&self) -> bool {
        self.paragraphs != self.original_paragraphs
    }

    /// Serializes the package, re-emitting `word/document.xml` only if some
    /// paragraph text changed.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let rewritten = if self.is_modified() {
            Some(self.rewrite_document_xml()?)
        } else {
            None
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut archive = zip::ZipWriter::new(&mut cursor);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, bytes) in &self.parts {
            archive
                .start_file(name.clone(), options)
                .map_err(std::io::Error::from)?;
            let payload = match (&rewritten, name.as_str()) {
                (Some(xml), DOCUMENT_PART) => xml.as_bytes(),
                _ => bytes.as_slice(),
            };
            std::io::Write::write_all(&mut archive, payload)?;
        }
        archive.finish().map_err(std::io::Error::from)?;

        Ok(cursor.into_inner())
    }

    pub fn save_as(&self, path: &Path) -> Result<(), DocxError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Streams the original document XML into a new buffer, replacing the run
    /// content of each modified paragraph with a single run holding the new
    /// text. Paragraph properties are copied through untouched.
    fn rewrite_document_xml(&self) -> Result<String, DocxError> {
        #[derive(PartialEq)]
        enum Mode {
            /// Outside a modified paragraph — copy events verbatim.
            Copy,
            /// Inside a modified paragraph, before its first run — copy
            /// `w:pPr` etc., inject the new run at the first `w:r`.
            Props,
            /// Inside a modified paragraph, after injection — drop the
            /// original runs until `</w:p>`.
            Skip,
        }

        enum Action {
            Copy,
            Drop,
            Inject,
            EndParagraph,
        }

        let mut reader = Reader::from_str(&self.document_xml);
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let mut mode = Mode::Copy;
        let mut paragraph_index = 0usize;
        let mut current_text: &str = "";

        loop {
            let event = reader.read_event().map_err(xml_err)?;
            let action = match &event {
                Event::Eof => break,
                Event::Start(e) if mode == Mode::Copy && e.name().as_ref() == b"w:p" => {
                    let index = paragraph_index;
                    paragraph_index += 1;
                    if self.paragraphs.get(index) != self.original_paragraphs.get(index) {
                        current_text = self
                            .paragraphs
                            .get(index)
                            .map(String::as_str)
                            .unwrap_or_default();
                        mode = Mode::Props;
                    }
                    Action::Copy
                }
                Event::Start(e) | Event::Empty(e)
                    if mode == Mode::Props && e.name().as_ref() == b"w:r" =>
                {
                    Action::Inject
                }
                Event::End(e) if mode != Mode::Copy && e.name().as_ref() == b"w:p" => {
                    Action::EndParagraph
                }
                _ if mode == Mode::Skip => Action::Drop,
                _ => Action::Copy,
            };

            match action {
                Action::Copy => writer.write_event(event).map_err(xml_err)?,
                Action::Drop => {}
                Action::Inject => {
                    write_text_run(&mut writer, current_text)?;
                    mode = Mode::Skip;
                }
                Action::EndParagraph => {
                    // A modified paragraph that never had a run cannot occur
                    // (its text was empty), but stay safe and inject anyway.
                    if mode == Mode::Props {
                        write_text_run(&mut writer, current_text)?;
                    }
                    mode = Mode::Copy;
                    writer.write_event(event).map_err(xml_err)?;
                }
            }
        }

        String::from_utf8(writer.into_inner().into_inner()).map_err(xml_err)
    }
}

fn write_text_run(writer: &mut Writer<Cursor<Vec<u8>>>, text: &str) -> Result<(), DocxError> {
    writer
        .write_event(Event::Start(BytesStart::new("w:r")))
        .map_err(xml_err)?;
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(t)).map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("w:t")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("w:r")))
        .map_err(xml_err)?;
    Ok(())
}

/// Extracts paragraph texts from `word/document.xml`: one entry per `w:p`
/// (empty paragraphs included, so indices line up with the rewrite pass),
/// text taken from `w:t` elements only.
fn parse_paragraphs(xml: &str) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" if in_paragraph => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:p" {
                    paragraphs.push(String::new());
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraphs.push(std::mem::take(&mut current));
                    in_paragraph = false;
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    current.push_str(&e.xml_content().map_err(xml_err)?);
                }
            }
            // Escaped characters arrive as separate reference events, not as
            // part of the surrounding text.
            Event::GeneralRef(e) => {
                if in_text {
                    if let Some(ch) = e.resolve_char_ref().map_err(xml_err)? {
                        current.push(ch);
                    } else {
                        match e.as_ref() {
                            b"amp" => current.push('&'),
                            b"lt" => current.push('<'),
                            b"gt" => current.push('>'),
                            b"quot" => current.push('"'),
                            b"apos" => current.push('\''),
                            name => {
                                // Unknown entity: keep it verbatim rather
                                // than losing characters.
                                current.push('&');
                                current.push_str(&String::from_utf8_lossy(name));
                                current.push(';');
                            }
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Reads a .docx from disk, retrying while the file is exclusively held by
/// another process. Exhausting the attempts surfaces `DocxError::Locked`,
/// distinguishable from a malformed container and from plain I/O failures.
pub async fn open_with_retry(path: &Path, retry: &LockRetry) -> Result<DocxDocument, DocxError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match std::fs::read(path) {
            Ok(bytes) => return DocxDocument::from_bytes(&bytes),
            Err(err) if is_lock_error(&err) => {
                if attempt >= retry.attempts.max(1) {
                    warn!(
                        "document {} still locked after {attempt} attempts, giving up",
                        path.display()
                    );
                    return Err(DocxError::Locked { attempts: attempt });
                }
                warn!(
                    "document {} is busy (attempt {attempt}), retrying in {:?}",
                    path.display(),
                    retry.delay
                );
                tokio::time::sleep(retry.delay).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn is_lock_error(err: &std::io::Error) -> bool {
    // Windows reports a file opened exclusively (e.g. by Word) as a sharing
    // violation (os error 32); unix advisory locks show up as WouldBlock.
    matches!(
        err.kind(),
        std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WouldBlock
    ) || err.raw_os_error() == Some(32)
}
