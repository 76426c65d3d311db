#![deny(missing_docs)]

//! Core library for Rusty Digest, a PDF summarizer built on chunked map-reduce generation.

/// HTTP routing and upload handlers.
pub mod api;
/// Folder batch job writing Markdown summaries next to each other.
pub mod batch;
/// Environment-driven configuration management.
pub mod config;
/// Plain-text extraction from PDF bytes.
pub mod extraction;
/// Chat-completion client abstraction and adapters.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization metrics helpers.
pub mod metrics;
/// Document summarization pipeline.
pub mod processing;
