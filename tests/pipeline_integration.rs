use httpmock::{Method::POST, MockServer};
use rustydigest::{
    batch::{BatchOptions, run_batch},
    extraction::{ExtractionError, TextExtractor},
    generation::OpenAiGenerationClient,
    processing::{Document, PipelineConfig, PipelineError, SummarizationService, SummaryPath},
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

const COMBINED: &str = "# Lecture\n\n## Overview\nCombined.";

struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

fn service_for(server: &MockServer) -> SummarizationService {
    let client = OpenAiGenerationClient::new(
        server.url("/v1"),
        "test-key".into(),
        Duration::from_secs(5),
    )
    .expect("client");
    SummarizationService::new(Arc::new(client), Arc::new(PlainTextExtractor))
}

fn small_chunks() -> PipelineConfig {
    PipelineConfig {
        max_chars_per_chunk: 1000,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn long_document_is_mapped_then_reduced_over_http() {
    let server = MockServer::start_async().await;
    let chunk_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("5-8 bullet points");
            then.status(200).json_body(completion("- a partial point"));
        })
        .await;
    let combine_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Partial summaries:")
                .body_contains("# Lecture");
            then.status(200).json_body(completion(COMBINED));
        })
        .await;

    // 1800 chars with a 1000/500 window: starts at 0, 500, 1000, 1500.
    let document = Document::new("Lecture", "x".repeat(1800));
    let summary = service_for(&server)
        .summarize_document(&document, &small_chunks(), &CancellationToken::new())
        .await
        .expect("summary");

    assert_eq!(summary.chunk_count, 4);
    assert_eq!(summary.path, SummaryPath::MapReduce);
    assert_eq!(summary.markdown, COMBINED);
    chunk_mock.assert_hits_async(4).await;
    combine_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn short_document_uses_a_single_request() {
    let server = MockServer::start_async().await;
    let chunk_mock = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("5-8 bullet points");
            then.status(200).json_body(completion("- unused"));
        })
        .await;
    let combine_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .body_contains("Partial summaries:")
                .body_contains("short body");
            then.status(200).json_body(completion(COMBINED));
        })
        .await;

    let service = service_for(&server);
    let summary = service
        .summarize_document(
            &Document::new("Lecture", "short body"),
            &PipelineConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("summary");

    assert_eq!(summary.path, SummaryPath::SingleCall);
    assert_eq!(summary.chunk_count, 1);
    chunk_mock.assert_hits_async(0).await;
    combine_mock.assert_hits_async(1).await;
    assert_eq!(service.metrics_snapshot().generation_requests, 1);
}

#[tokio::test]
async fn provider_error_fails_the_document_before_combining() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("5-8 bullet points");
            then.status(500).body("upstream exploded");
        })
        .await;
    let combine_mock = server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Partial summaries:");
            then.status(200).json_body(completion(COMBINED));
        })
        .await;

    let service = service_for(&server);
    let error = service
        .summarize_document(
            &Document::new("Lecture", "y".repeat(1800)),
            &small_chunks(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("chunk failure");

    assert!(matches!(error, PipelineError::ChunkSummary { index: 0, .. }));
    combine_mock.assert_hits_async(0).await;
    assert_eq!(service.metrics_snapshot().documents_failed, 1);
}

#[tokio::test]
async fn batch_writes_summaries_and_isolates_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).body_contains("Partial summaries:");
            then.status(200).json_body(completion(COMBINED));
        })
        .await;

    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");
    std::fs::write(input.path().join("a.pdf"), "first lecture").expect("write a");
    std::fs::write(input.path().join("b.PDF"), "   ").expect("write b");
    std::fs::write(input.path().join("notes.txt"), "ignored").expect("write txt");

    let options = BatchOptions {
        input_dir: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        force: false,
    };
    let service = service_for(&server);
    let report = run_batch(
        &service,
        &options,
        &PipelineConfig::default(),
        &CancellationToken::new(),
    )
    .await
    .expect("batch");

    assert_eq!(report.summarized.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("no extractable text"));

    let written = std::fs::read_to_string(output.path().join("a.summary.md")).expect("summary");
    assert_eq!(written, format!("{COMBINED}\n"));
    assert!(!output.path().join("b.summary.md").exists());
    let leftovers: Vec<_> = std::fs::read_dir(output.path())
        .expect("list output")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let rerun = run_batch(
        &service,
        &options,
        &PipelineConfig::default(),
        &CancellationToken::new(),
    )
    .await
    .expect("second batch");
    assert_eq!(rerun.skipped.len(), 1);
    assert!(rerun.summarized.is_empty());
}
