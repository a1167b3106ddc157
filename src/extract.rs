//! Multi-format text extraction dispatched on file extension.
//!
//! The closed set of supported formats is `{pdf, docx, txt, md}`, matched
//! case-insensitively; any other extension is rejected with
//! [`PipelineError::UnsupportedFormat`] before any I/O on the file body.
//! Empty or whitespace-only output is a valid result here — callers decide
//! how to treat it.

use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// Extensions accepted by the pipeline, lower-cased and without the dot.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md"];

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection for DOCX archives).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// One of the four supported document formats. Adding a format means adding
/// a variant here, not editing a dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Markdown,
}

impl DocumentFormat {
    /// Resolve the format from a path's extension, lower-cased.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| PipelineError::UnsupportedFormat(path.display().to_string()))?;
        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            "md" => Ok(DocumentFormat::Markdown),
            _ => Err(PipelineError::UnsupportedFormat(ext)),
        }
    }

    /// Extract plain text from `path` using this format's parser.
    pub fn extract(&self, path: &Path) -> Result<String, PipelineError> {
        match self {
            DocumentFormat::Pdf => extract_pdf(path),
            DocumentFormat::Docx => extract_docx(path),
            DocumentFormat::Txt | DocumentFormat::Markdown => extract_utf8(path),
        }
    }
}

/// Extract plain text from a document, dispatching on its extension.
pub fn extract_text(path: &Path) -> Result<String, PipelineError> {
    DocumentFormat::from_path(path)?.extract(path)
}

fn extraction_err(path: &Path, cause: impl std::fmt::Display) -> PipelineError {
    PipelineError::Extraction {
        path: path.display().to_string(),
        cause: cause.to_string(),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, PipelineError> {
    std::fs::read(path).map_err(|e| extraction_err(path, e))
}

/// Whole-document PDF extraction in page order. Pages without extractable
/// text contribute nothing; only a total parse failure is an error.
fn extract_pdf(path: &Path) -> Result<String, PipelineError> {
    let bytes = read_bytes(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| extraction_err(path, e))
}

/// DOCX: unzip `word/document.xml` and concatenate the `<w:t>` runs, with a
/// newline at every paragraph (`<w:p>`) boundary.
fn extract_docx(path: &Path) -> Result<String, PipelineError> {
    let bytes = read_bytes(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| extraction_err(path, e))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|e| extraction_err(path, e))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| extraction_err(path, e))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(extraction_err(path, "word/document.xml exceeds size limit"));
        }
    }

    paragraphs_from_docx_xml(&doc_xml).map_err(|e| extraction_err(path, e))
}

/// Walk the WordprocessingML body, collecting `<w:t>` text runs and emitting
/// a newline at the end of each paragraph.
fn paragraphs_from_docx_xml(xml: &[u8]) -> Result<String, quick_xml::Error> {
    // Text events are taken verbatim; `<w:t>` runs carry significant
    // whitespace at their edges ("Hello " + "world").
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            quick_xml::events::Event::Start(e) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            quick_xml::events::Event::Text(t) if in_text_run => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            quick_xml::events::Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if !out.ends_with('\n') && !out.is_empty() {
                        out.push('\n');
                    }
                }
                _ => {}
            },
            quick_xml::events::Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    // Paragraph separators, not a trailing terminator.
    while out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// TXT and Markdown are read verbatim; bytes must be valid UTF-8.
fn extract_utf8(path: &Path) -> Result<String, PipelineError> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|e| extraction_err(path, e))
}
