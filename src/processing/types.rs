//! Core data types and error definitions for the summarization pipeline.

use super::chunking::DEFAULT_OVERLAP;
use super::style::Style;
use crate::extraction::ExtractionError;
use crate::generation::GenerationClientError;
use serde::Serialize;
use thiserror::Error;

/// Longest chunk text forwarded to a single chunk-summary request.
pub const DEFAULT_CHUNK_REQUEST_CHARS: usize = 12_000;
/// Longest joined text forwarded to the combine request.
pub const DEFAULT_COMBINE_REQUEST_CHARS: usize = 24_000;
/// Sampling temperature used for every request.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Errors produced by invalid chunk geometry.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk size of zero cannot hold any text.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap leaves no room for the window to advance.
    #[error("overlap ({overlap}) must be smaller than the chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Requested overlap in characters.
        overlap: usize,
        /// Requested chunk size in characters.
        chunk_size: usize,
    },
}

/// Errors emitted by the summarization pipeline for one document.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chunk size / overlap combination is unusable; raised before any request is sent.
    #[error("Invalid pipeline configuration: {0}")]
    Configuration(#[from] ChunkingError),
    /// The document has no extractable text.
    #[error("Document '{title}' contains no extractable text")]
    EmptyDocument {
        /// Title of the rejected document.
        title: String,
    },
    /// Summarizing one chunk failed; the whole document is abandoned.
    #[error("Failed to summarize chunk {index}: {source}")]
    ChunkSummary {
        /// Zero-based index of the failing chunk.
        index: usize,
        /// Underlying generation error.
        #[source]
        source: GenerationClientError,
    },
    /// The combine request failed.
    #[error("Failed to combine summaries: {0}")]
    Combine(#[source] GenerationClientError),
    /// The caller cancelled the document between two requests.
    #[error("Summarization cancelled")]
    Cancelled,
}

/// Failure of one document in the batch job or the upload surface.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Text could not be extracted from the document.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The pipeline rejected or failed the document.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// The summary could not be written.
    #[error("Failed to write summary to {path}: {source}")]
    Output {
        /// Destination that could not be written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A blocking extraction task panicked or was cancelled by the runtime.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// A titled body of extracted plain text.
#[derive(Debug, Clone)]
pub struct Document {
    /// Title used in the combined summary (usually the file stem).
    pub title: String,
    /// Extracted text.
    pub text: String,
}

impl Document {
    /// Build a document from a title and its extracted text.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Per-invocation pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Model identifier passed to the generation service.
    pub model: String,
    /// Tone preset.
    pub style: Style,
    /// Window size in characters.
    pub max_chars_per_chunk: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Truncation applied to chunk text before a chunk-summary request.
    pub chunk_request_chars: usize,
    /// Truncation applied to the joined partial summaries before the combine request.
    pub combine_request_chars: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Chunk-summary requests allowed in flight for one document.
    pub chunk_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".into(),
            style: Style::Default,
            max_chars_per_chunk: 6000,
            overlap: DEFAULT_OVERLAP,
            chunk_request_chars: DEFAULT_CHUNK_REQUEST_CHARS,
            combine_request_chars: DEFAULT_COMBINE_REQUEST_CHARS,
            temperature: DEFAULT_TEMPERATURE,
            chunk_concurrency: 1,
        }
    }
}

impl PipelineConfig {
    /// Check the chunk geometry before any request is issued.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        super::chunking::validate_chunking(self.max_chars_per_chunk, self.overlap)
    }
}

/// Which route the orchestrator took for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPath {
    /// Text fit in one chunk; the combiner summarized it directly.
    SingleCall,
    /// Chunks were summarized individually and then combined.
    MapReduce,
}

/// Final structured summary produced for one document.
#[derive(Debug, Clone, Serialize)]
pub struct FinalSummary {
    /// Document title.
    pub title: String,
    /// Markdown body returned by the combiner.
    pub markdown: String,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Route taken through the pipeline.
    pub path: SummaryPath,
}
