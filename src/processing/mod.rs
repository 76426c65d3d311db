//! Document summarization pipeline: chunking, per-chunk summaries, and the combine step.

pub mod chunking;
mod service;
pub mod style;
pub mod summarize;
pub mod types;

pub use chunking::{Chunk, chunk_text};
pub use service::{SummarizationApi, SummarizationService};
pub use style::Style;
pub use types::{
    ChunkingError, Document, DocumentError, FinalSummary, PipelineConfig, PipelineError,
    SummaryPath,
};
