//! Summarization service coordinating extraction, chunking, and the map-reduce requests.

use crate::{
    extraction::{ExtractionError, TextExtractor},
    generation::GenerationClient,
    metrics::{MetricsSnapshot, SummaryMetrics},
    processing::{
        chunking::{Chunk, chunk_text},
        summarize::{RequestOptions, combine_summaries, summarize_chunk},
        types::{
            Document, DocumentError, FinalSummary, PipelineConfig, PipelineError, SummaryPath,
        },
    },
};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Runs the chunk → summarize → combine pipeline for one document at a time.
///
/// The service owns the process-wide generation client, the text extractor, and the metrics
/// registry so both the batch job and the upload server share them. Construct it once near
/// process start and share it through an `Arc`; every call takes its own [`PipelineConfig`].
pub struct SummarizationService {
    client: Arc<dyn GenerationClient>,
    extractor: Arc<dyn TextExtractor>,
    metrics: Arc<SummaryMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, batch).
#[async_trait]
pub trait SummarizationApi: Send + Sync {
    /// Extract text from raw document bytes and summarize it.
    async fn summarize_bytes(
        &self,
        title: &str,
        bytes: Vec<u8>,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError>;

    /// Read a document from disk and summarize it.
    async fn summarize_file(
        &self,
        title: &str,
        path: &Path,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError> {
        let bytes = tokio::fs::read(path).await.map_err(ExtractionError::from)?;
        self.summarize_bytes(title, bytes, config, cancel).await
    }

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummarizationService {
    /// Build a service around an already-configured generation client and extractor.
    pub fn new(client: Arc<dyn GenerationClient>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            client,
            extractor,
            metrics: Arc::new(SummaryMetrics::new()),
        }
    }

    /// Summarize already-extracted text.
    ///
    /// Validates the configuration and the text before any request is sent, then takes the
    /// single-call path for one chunk or the map-reduce path otherwise. The cancellation token
    /// is checked before every request; in-flight requests are never interrupted by it.
    pub async fn summarize_document(
        &self,
        document: &Document,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, PipelineError> {
        let result = self.run_pipeline(document, config, cancel).await;
        match &result {
            Ok(summary) => {
                self.metrics.record_document(summary.chunk_count as u64);
                tracing::info!(
                    document = %document.title,
                    chunks = summary.chunk_count,
                    path = ?summary.path,
                    "Document summarized"
                );
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(document = %document.title, error = %error, "Summarization failed");
            }
        }
        result
    }

    async fn run_pipeline(
        &self,
        document: &Document,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, PipelineError> {
        config.validate()?;
        if document.text.trim().is_empty() {
            return Err(PipelineError::EmptyDocument {
                title: document.title.clone(),
            });
        }

        let chunks = chunk_text(&document.text, config.max_chars_per_chunk, config.overlap)?;
        let chunk_count = chunks.len();
        tracing::debug!(
            document = %document.title,
            chunks = chunk_count,
            chunk_size = config.max_chars_per_chunk,
            overlap = config.overlap,
            model = %config.model,
            style = %config.style,
            "Chunked document"
        );

        let combine_options = RequestOptions {
            model: &config.model,
            style: config.style,
            temperature: config.temperature,
            max_input_chars: config.combine_request_chars,
        };

        let (partials, path) = if chunk_count == 1 {
            let raw = chunks.into_iter().map(|chunk| chunk.text).collect::<Vec<_>>();
            (raw, SummaryPath::SingleCall)
        } else {
            let partials = self.summarize_chunks(&chunks, config, cancel).await?;
            (partials, SummaryPath::MapReduce)
        };

        self.checkpoint(cancel)?;
        let markdown = combine_summaries(
            self.client.as_ref(),
            &partials,
            &document.title,
            combine_options,
        )
        .await
        .map_err(PipelineError::Combine)?;

        Ok(FinalSummary {
            title: document.title.clone(),
            markdown,
            chunk_count,
            path,
        })
    }

    /// Map step: summarize every chunk, keeping document order regardless of completion order.
    ///
    /// The first failure (in chunk order) aborts the document and drops any pending requests.
    async fn summarize_chunks(
        &self,
        chunks: &[Chunk],
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, PipelineError> {
        let options = RequestOptions {
            model: &config.model,
            style: config.style,
            temperature: config.temperature,
            max_input_chars: config.chunk_request_chars,
        };

        let pending: Vec<_> = chunks
            .iter()
            .map(|chunk| self.summarize_one(chunk, options, cancel))
            .collect();
        stream::iter(pending)
            .buffered(config.chunk_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn summarize_one(
        &self,
        chunk: &Chunk,
        options: RequestOptions<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        self.checkpoint(cancel)?;
        tracing::debug!(
            chunk = chunk.index,
            start = chunk.start,
            end = chunk.end,
            "Summarizing chunk"
        );
        summarize_chunk(self.client.as_ref(), &chunk.text, options)
            .await
            .map_err(|source| PipelineError::ChunkSummary {
                index: chunk.index,
                source,
            })
    }

    /// Request boundary: bail out if cancelled, otherwise count the request about to be sent.
    fn checkpoint(&self, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.metrics.record_request();
        Ok(())
    }

    /// Extract and summarize a raw document.
    pub async fn summarize_bytes(
        &self,
        title: &str,
        bytes: Vec<u8>,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError> {
        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|error| DocumentError::Task(error.to_string()))
            .and_then(|extracted| extracted.map_err(DocumentError::from))
            .inspect_err(|_| self.metrics.record_failure())?;
        tracing::debug!(document = title, chars = text.chars().count(), "Extracted text");

        let document = Document::new(title, text);
        Ok(self.summarize_document(&document, config, cancel).await?)
    }

    /// Read a document from disk, then extract and summarize it.
    pub async fn summarize_file(
        &self,
        title: &str,
        path: &Path,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|error| DocumentError::from(ExtractionError::from(error)))
            .inspect_err(|_| self.metrics.record_failure())?;
        self.summarize_bytes(title, bytes, config, cancel).await
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl SummarizationApi for SummarizationService {
    async fn summarize_bytes(
        &self,
        title: &str,
        bytes: Vec<u8>,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError> {
        SummarizationService::summarize_bytes(self, title, bytes, config, cancel).await
    }

    async fn summarize_file(
        &self,
        title: &str,
        path: &Path,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<FinalSummary, DocumentError> {
        SummarizationService::summarize_file(self, title, path, config, cancel).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummarizationService::metrics_snapshot(self)
    }
}
