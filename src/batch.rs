//! Folder batch job: summarize every PDF in a directory into `<stem>.summary.md` files.
//!
//! The output file is the only "already processed" marker; existing outputs are skipped unless
//! the caller forces regeneration. Documents are processed one after another in file-name
//! order. A failing document is logged and counted, and the batch moves on. Summaries are
//! written to a temporary sibling and renamed into place, so a failed or cancelled document
//! never leaves a partial file.

use crate::processing::{
    ChunkingError, DocumentError, PipelineConfig, PipelineError, SummarizationApi,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// Suffix appended to a document's stem to name its summary.
pub const SUMMARY_SUFFIX: &str = ".summary.md";

/// Errors that stop the batch before any document is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Chunk size / overlap combination is unusable.
    #[error("Invalid pipeline configuration: {0}")]
    Configuration(#[from] ChunkingError),
    /// Input or output directory could not be prepared or listed.
    #[error("Failed to prepare {path}: {source}")]
    Io {
        /// Directory that caused the failure.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Directories and flags for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Folder scanned for `*.pdf` files (not recursive).
    pub input_dir: PathBuf,
    /// Folder receiving the `.summary.md` files.
    pub output_dir: PathBuf,
    /// Regenerate summaries that already exist.
    pub force: bool,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Summaries written.
    pub summarized: Vec<PathBuf>,
    /// Documents skipped because their summary already existed.
    pub skipped: Vec<PathBuf>,
    /// Documents that failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
    /// Whether the run stopped early because of cancellation.
    pub cancelled: bool,
}

/// Path of the summary written for `document`.
pub fn summary_path(output_dir: &Path, document: &Path) -> PathBuf {
    output_dir.join(format!("{}{SUMMARY_SUFFIX}", document_title(document)))
}

/// Title used for a document: its file stem.
pub fn document_title(document: &Path) -> String {
    document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// List `*.pdf` files (any extension case) directly inside `dir`, sorted by name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut pdfs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|error| BatchError::Io {
            path: dir.display().to_string(),
            source: error.into(),
        })?;
        let is_pdf = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            pdfs.push(entry.into_path());
        }
    }
    Ok(pdfs)
}

/// Summarize every PDF in `options.input_dir`.
///
/// Fails early only for problems that affect the whole run (invalid configuration, unusable
/// directories). Per-document failures are recorded in the returned report.
pub async fn run_batch<S>(
    service: &S,
    options: &BatchOptions,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<BatchReport, BatchError>
where
    S: SummarizationApi + ?Sized,
{
    config.validate()?;
    for dir in [&options.input_dir, &options.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| BatchError::Io {
                path: dir.display().to_string(),
                source,
            })?;
    }

    let mut report = BatchReport::default();
    let pdfs = discover_pdfs(&options.input_dir)?;
    if pdfs.is_empty() {
        tracing::info!(path = %options.input_dir.display(), "No PDFs found");
        return Ok(report);
    }

    for pdf in pdfs {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let output = summary_path(&options.output_dir, &pdf);
        if output.exists() && !options.force {
            tracing::info!(path = %pdf.display(), "Skipping; summary already exists");
            report.skipped.push(pdf);
            continue;
        }

        tracing::info!(path = %pdf.display(), "Processing document");
        match summarize_to_file(service, &pdf, &output, config, cancel).await {
            Ok(()) => {
                tracing::info!(path = %output.display(), "Summary saved");
                report.summarized.push(output);
            }
            Err(DocumentError::Pipeline(PipelineError::Cancelled)) => {
                tracing::warn!(path = %pdf.display(), "Cancelled; document abandoned");
                report.cancelled = true;
                break;
            }
            Err(error) => {
                tracing::error!(path = %pdf.display(), error = %error, "Failed to summarize document");
                report.failed.push((pdf, error.to_string()));
            }
        }
    }

    Ok(report)
}

async fn summarize_to_file<S>(
    service: &S,
    pdf: &Path,
    output: &Path,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<(), DocumentError>
where
    S: SummarizationApi + ?Sized,
{
    let summary = service
        .summarize_file(&document_title(pdf), pdf, config, cancel)
        .await?;
    write_atomically(output, &summary.markdown).await
}

/// Write `contents` to a temporary sibling of `path`, then rename it into place.
async fn write_atomically(path: &Path, contents: &str) -> Result<(), DocumentError> {
    let output_error = |source: std::io::Error| DocumentError::Output {
        path: path.display().to_string(),
        source,
    };
    let mut body = contents.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }

    let tmp = path.with_extension("md.tmp");
    if let Err(error) = tokio::fs::write(&tmp, body).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(output_error(error));
    }
    if let Err(error) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(output_error(error));
    }
    Ok(())
}
