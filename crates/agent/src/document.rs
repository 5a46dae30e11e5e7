//! Turning uploaded bytes into prompt text.
//!
//! PDFs go through `pdf-extract`; code uploads must be UTF-8 and carry one
//! of the known source extensions.

use relaydesk_core::error::DocumentError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extensions accepted for code review uploads.
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "java", "cpp", "c", "ts", "tsx", "jsx", "cs", "rb", "go", "rs", "php",
];

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Binary formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
        }
    }
}

/// Extract the text of a document, pages in order, trimmed.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, DocumentError> {
    match format {
        DocumentFormat::Pdf => extract_pdf(bytes),
    }
}

/// [`extract_text`] on the blocking pool. Extraction is CPU-bound and a
/// malformed file can make the parser panic; both stay off the runtime.
pub async fn extract_text_blocking(
    bytes: Vec<u8>,
    format: DocumentFormat,
) -> Result<String, DocumentError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .map_err(|e| DocumentError::Extraction {
            format: format.as_str().into(),
            reason: format!("extractor aborted: {e}"),
        })?
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(DocumentError::Extraction {
            format: "pdf".into(),
            reason: "missing %PDF- header".into(),
        });
    }

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        DocumentError::Extraction {
            format: "pdf".into(),
            reason: e.to_string(),
        }
    })?;

    let text = join_pages(&pages);
    debug!(
        bytes = bytes.len(),
        pages = pages.len(),
        chars = text.chars().count(),
        "Extracted PDF text"
    );
    Ok(text)
}

/// One line break between pages; blank pages are dropped.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercased extension of `filename`, if it has one.
fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

pub fn is_code_file(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| CODE_EXTENSIONS.contains(&ext.as_str()))
}

/// Check the extension and decode an uploaded source file.
pub fn decode_code_file(filename: &str, bytes: Vec<u8>) -> Result<String, DocumentError> {
    if !is_code_file(filename) {
        return Err(DocumentError::UnsupportedFormat(
            extension(filename).unwrap_or_else(|| filename.to_string()),
        ));
    }
    String::from_utf8(bytes).map_err(|_| DocumentError::InvalidEncoding {
        filename: filename.to_string(),
    })
}
