//! Plain-text extraction for uploaded and batch documents.
//!
//! `pdf-extract` returns the text of the whole file in one string with form-feed characters
//! between pages. Pages without visible text are dropped and the rest are joined with a blank
//! line. A PDF that parses but yields no text is not an error here; the pipeline reports it as
//! an empty document.

use thiserror::Error;

/// Errors raised while reading text out of a document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF could not be parsed.
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),
    /// The document could not be read from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of `bytes`, pages in order.
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Extractor backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed font tables instead of returning an error.
        let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| ExtractionError::Pdf("extractor panicked on malformed input".into()))?
            .map_err(|error| ExtractionError::Pdf(error.to_string()))?;
        Ok(join_pages(&raw))
    }
}

/// Split extractor output on form feeds, skip blank pages and join the rest with a blank line.
pub(crate) fn join_pages(raw: &str) -> String {
    raw.split('\x0C')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
