use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use rustydigest::{
    batch::{self, BatchOptions},
    config,
    extraction::PdfTextExtractor,
    generation, logging,
    processing::{Style, SummarizationService},
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(
    name = "rustydigest-batch",
    about = "Summarize every PDF in a folder into Markdown files"
)]
struct Cli {
    /// Folder scanned for PDFs.
    #[arg(long, default_value = "docs")]
    input_dir: PathBuf,
    /// Folder receiving `<stem>.summary.md` files.
    #[arg(long, default_value = "summaries")]
    output_dir: PathBuf,
    /// Model override (defaults to SUMMARY_MODEL).
    #[arg(long)]
    model: Option<String>,
    /// Tone preset: default, bullet, narrative, or executive.
    #[arg(long)]
    style: Option<String>,
    /// Characters per chunk (defaults to SUMMARY_MAX_CHARS_PER_CHUNK).
    #[arg(long)]
    max_chars: Option<usize>,
    /// Regenerate summaries that already exist.
    #[arg(long)]
    force: bool,
    /// Chunk-summary requests in flight per document.
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing();

    let mut pipeline = config.pipeline_defaults();
    if let Some(model) = cli.model {
        pipeline.model = model;
    }
    if let Some(style) = cli.style.as_deref() {
        pipeline.style = Style::parse_lossy(style);
    }
    if let Some(max_chars) = cli.max_chars {
        pipeline.max_chars_per_chunk = max_chars;
    }
    if let Some(concurrency) = cli.concurrency {
        pipeline.chunk_concurrency = concurrency.max(1);
    }
    pipeline
        .validate()
        .context("invalid pipeline configuration")?;

    let client = generation::build_generation_client(config)
        .context("failed to build generation client")?;
    let service = SummarizationService::new(client, Arc::new(PdfTextExtractor));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing at the next request boundary");
            on_signal.cancel();
        }
    });

    tracing::info!(
        input = %cli.input_dir.display(),
        output = %cli.output_dir.display(),
        model = %pipeline.model,
        style = %pipeline.style,
        max_chars_per_chunk = pipeline.max_chars_per_chunk,
        "Starting batch"
    );
    let options = BatchOptions {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        force: cli.force,
    };
    let report = batch::run_batch(&service, &options, &pipeline, &cancel).await?;

    tracing::info!(
        summarized = report.summarized.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        cancelled = report.cancelled,
        metrics = ?service.metrics_snapshot(),
        "Batch finished"
    );
    Ok(())
}
